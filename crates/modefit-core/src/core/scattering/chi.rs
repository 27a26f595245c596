use super::scorer::ScoringError;
use crate::core::models::profile::validate_grid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiOptions {
    /// Fit the least-squares intensity scale factor before computing residuals.
    pub fit_scale: bool,
}

impl Default for ChiOptions {
    fn default() -> Self {
        Self { fit_scale: true }
    }
}

/// Reduced chi between an experimental curve and a model curve.
///
/// The model is linearly interpolated onto the experimental grid when the two
/// grids differ. With `fit_scale` the model is first multiplied by the factor
/// `c` minimizing the weighted squared residuals. The result is
/// `sqrt(mean(((I_exp - c * I_mod) / sigma)^2))`, with `sigma = 1` when the
/// experiment carries no uncertainties.
pub fn chi(
    q: &[f64],
    exp_intensity: &[f64],
    exp_sigma: Option<&[f64]>,
    model_q: &[f64],
    model_intensity: &[f64],
    options: ChiOptions,
) -> Result<f64, ScoringError> {
    if q.is_empty() || model_q.is_empty() {
        return Err(ScoringError::EmptyGrid);
    }
    check_length("experimental intensities", q.len(), exp_intensity.len())?;
    check_length("model intensities", model_q.len(), model_intensity.len())?;
    validate_grid(q)?;
    validate_grid(model_q)?;
    if let Some(sigma) = exp_sigma {
        check_length("experimental uncertainties", q.len(), sigma.len())?;
        if let Some((index, &value)) = sigma
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.is_finite() && **s > 0.0))
        {
            return Err(ScoringError::InvalidSigma { index, value });
        }
    }

    let model = if model_q == q {
        model_intensity.to_vec()
    } else {
        interpolate(model_q, model_intensity, q)?
    };

    let weight = |i: usize| exp_sigma.map_or(1.0, |s| s[i] * s[i]);
    let scale = if options.fit_scale {
        scale_factor(exp_intensity, &model, weight)
    } else {
        1.0
    };

    let sum: f64 = exp_intensity
        .iter()
        .zip(&model)
        .enumerate()
        .map(|(i, (e, m))| (e - scale * m).powi(2) / weight(i))
        .sum();
    Ok((sum / q.len() as f64).sqrt())
}

/// Least-squares factor `c` minimizing `sum(((e - c * m) / sigma)^2)`; `1` for an all-zero model.
fn scale_factor(exp: &[f64], model: &[f64], weight: impl Fn(usize) -> f64) -> f64 {
    let (mut num, mut den) = (0.0, 0.0);
    for (i, (e, m)) in exp.iter().zip(model).enumerate() {
        let w = weight(i);
        num += e * m / w;
        den += m * m / w;
    }
    if den > 0.0 { num / den } else { 1.0 }
}

/// Linear interpolation of `(from_q, from_values)` at each point of `to_q`.
///
/// `from_q` must be strictly increasing and cover every target value.
pub fn interpolate(
    from_q: &[f64],
    from_values: &[f64],
    to_q: &[f64],
) -> Result<Vec<f64>, ScoringError> {
    let (min, max) = match (from_q.first(), from_q.last()) {
        (Some(&min), Some(&max)) => (min, max),
        _ => return Err(ScoringError::EmptyGrid),
    };
    to_q.iter()
        .map(|&q| {
            if q < min || q > max {
                return Err(ScoringError::OutOfRange { q, min, max });
            }
            let upper = from_q.partition_point(|&x| x < q);
            if from_q[upper] == q {
                return Ok(from_values[upper]);
            }
            let lower = upper - 1;
            let t = (q - from_q[lower]) / (from_q[upper] - from_q[lower]);
            Ok(from_values[lower] + t * (from_values[upper] - from_values[lower]))
        })
        .collect()
}

fn check_length(what: &'static str, expected: usize, found: usize) -> Result<(), ScoringError> {
    if expected != found {
        return Err(ScoringError::LengthMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}
