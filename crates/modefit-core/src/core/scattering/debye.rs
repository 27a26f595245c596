use super::scorer::{ScatteringScorer, ScoringError};
use crate::core::models::coords::CoordinateSet;
use crate::core::models::profile::validate_grid;

/// Debye-equation scorer treating every node as an identical point scatterer.
///
/// `I(q) = f^2 * sum_i sum_j sinc(q * r_ij)`, with `sinc(0) = 1`. Coarse, but it
/// responds to the overall shape of a conformation the way a real profile does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebyeScorer {
    pub form_factor: f64,
    pub fit_scale: bool,
}

impl Default for DebyeScorer {
    fn default() -> Self {
        Self {
            form_factor: 1.0,
            fit_scale: true,
        }
    }
}

impl DebyeScorer {
    pub fn new(form_factor: f64, fit_scale: bool) -> Self {
        Self {
            form_factor,
            fit_scale,
        }
    }
}

#[inline]
fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-8 { 1.0 } else { x.sin() / x }
}

impl ScatteringScorer for DebyeScorer {
    fn predict_profile(
        &self,
        coords: &CoordinateSet,
        q: &[f64],
    ) -> Result<Vec<f64>, ScoringError> {
        if q.is_empty() {
            return Err(ScoringError::EmptyGrid);
        }
        validate_grid(q)?;
        let points = coords.points();
        if let Some(index) = points
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(ScoringError::NonFiniteCoordinate { index });
        }

        let mut distances = Vec::with_capacity(points.len() * points.len().saturating_sub(1) / 2);
        for (i, pi) in points.iter().enumerate() {
            for pj in &points[i + 1..] {
                distances.push((pj - pi).norm());
            }
        }

        let f2 = self.form_factor * self.form_factor;
        let n = points.len() as f64;
        Ok(q.iter()
            .map(|&q| {
                let cross: f64 = distances.iter().map(|&r| sinc(q * r)).sum();
                f2 * (n + 2.0 * cross)
            })
            .collect())
    }

    fn fit_scale(&self) -> bool {
        self.fit_scale
    }
}
