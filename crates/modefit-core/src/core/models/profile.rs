use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("A scattering profile requires at least one point")]
    Empty,
    #[error("Column length mismatch: {q} Q values, {intensity} intensities")]
    IntensityLength { q: usize, intensity: usize },
    #[error("Column length mismatch: {q} Q values, {sigma} uncertainties")]
    SigmaLength { q: usize, sigma: usize },
    #[error("Q values must be strictly increasing (index {index}: {previous} then {current})")]
    NonIncreasingQ {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("Uncertainty at index {index} must be positive and finite (found {value})")]
    InvalidSigma { index: usize, value: f64 },
}

/// A scattering curve sampled on a momentum-transfer grid.
///
/// Holds `(Q, I, sigma)` triples with `Q` strictly increasing. Intensities are
/// always on a linear scale; any log-scale input is converted by the reader
/// before a profile is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatteringProfile {
    q: Vec<f64>,
    intensity: Vec<f64>,
    sigma: Option<Vec<f64>>,
}

impl ScatteringProfile {
    /// Builds a validated profile.
    ///
    /// # Arguments
    ///
    /// * `q` - Momentum-transfer values, strictly increasing.
    /// * `intensity` - One intensity per `q` value.
    /// * `sigma` - Optional experimental uncertainties, one per `q` value, all positive.
    ///
    /// # Errors
    ///
    /// Returns a [`ProfileError`] describing the first violated constraint.
    pub fn new(
        q: Vec<f64>,
        intensity: Vec<f64>,
        sigma: Option<Vec<f64>>,
    ) -> Result<Self, ProfileError> {
        if q.is_empty() {
            return Err(ProfileError::Empty);
        }
        if intensity.len() != q.len() {
            return Err(ProfileError::IntensityLength {
                q: q.len(),
                intensity: intensity.len(),
            });
        }
        validate_grid(&q)?;
        if let Some(sigma) = &sigma {
            if sigma.len() != q.len() {
                return Err(ProfileError::SigmaLength {
                    q: q.len(),
                    sigma: sigma.len(),
                });
            }
            if let Some((index, &value)) = sigma
                .iter()
                .enumerate()
                .find(|(_, s)| !(s.is_finite() && **s > 0.0))
            {
                return Err(ProfileError::InvalidSigma { index, value });
            }
        }
        Ok(Self {
            q,
            intensity,
            sigma,
        })
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn q(&self) -> &[f64] {
        &self.q
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    pub fn sigma(&self) -> Option<&[f64]> {
        self.sigma.as_deref()
    }

    /// Returns a profile on the same grid carrying new intensities and this profile's uncertainties.
    pub fn with_intensity(&self, intensity: Vec<f64>) -> Result<Self, ProfileError> {
        Self::new(self.q.clone(), intensity, self.sigma.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, Option<f64>)> + '_ {
        self.q
            .iter()
            .zip(self.intensity.iter())
            .enumerate()
            .map(|(i, (&q, &intensity))| (q, intensity, self.sigma.as_ref().map(|s| s[i])))
    }
}

pub(crate) fn validate_grid(q: &[f64]) -> Result<(), ProfileError> {
    for (index, pair) in q.windows(2).enumerate() {
        if !(pair[1] > pair[0]) {
            return Err(ProfileError::NonIncreasingQ {
                index: index + 1,
                previous: pair[0],
                current: pair[1],
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_valid_profile_without_sigma() {
        let profile = ScatteringProfile::new(vec![0.01, 0.02, 0.03], vec![3.0, 2.0, 1.0], None)
            .unwrap();
        assert_eq!(profile.len(), 3);
        assert!(profile.sigma().is_none());
    }

    #[test]
    fn new_rejects_empty_profile() {
        assert_eq!(
            ScatteringProfile::new(vec![], vec![], None),
            Err(ProfileError::Empty)
        );
    }

    #[test]
    fn new_rejects_non_increasing_q() {
        let result = ScatteringProfile::new(vec![0.1, 0.1, 0.2], vec![1.0, 1.0, 1.0], None);
        assert!(matches!(
            result,
            Err(ProfileError::NonIncreasingQ { index: 1, .. })
        ));
    }

    #[test]
    fn new_rejects_mismatched_columns() {
        let result = ScatteringProfile::new(vec![0.1, 0.2], vec![1.0], None);
        assert!(matches!(result, Err(ProfileError::IntensityLength { .. })));

        let result = ScatteringProfile::new(vec![0.1, 0.2], vec![1.0, 2.0], Some(vec![0.1]));
        assert!(matches!(result, Err(ProfileError::SigmaLength { .. })));
    }

    #[test]
    fn new_rejects_non_positive_sigma() {
        let result =
            ScatteringProfile::new(vec![0.1, 0.2], vec![1.0, 2.0], Some(vec![0.1, 0.0]));
        assert_eq!(
            result,
            Err(ProfileError::InvalidSigma {
                index: 1,
                value: 0.0
            })
        );
    }

    #[test]
    fn with_intensity_keeps_grid_and_sigma() {
        let profile =
            ScatteringProfile::new(vec![0.1, 0.2], vec![1.0, 2.0], Some(vec![0.5, 0.5])).unwrap();
        let updated = profile.with_intensity(vec![7.0, 8.0]).unwrap();
        assert_eq!(updated.q(), profile.q());
        assert_eq!(updated.sigma(), profile.sigma());
        assert_eq!(updated.intensity(), &[7.0, 8.0]);
    }

    #[test]
    fn iter_yields_triples_in_order() {
        let profile =
            ScatteringProfile::new(vec![0.1, 0.2], vec![1.0, 2.0], Some(vec![0.5, 0.25])).unwrap();
        let rows: Vec<_> = profile.iter().collect();
        assert_eq!(rows, vec![(0.1, 1.0, Some(0.5)), (0.2, 2.0, Some(0.25))]);
    }
}
