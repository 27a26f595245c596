use super::chi::{self, ChiOptions};
use crate::core::models::coords::CoordinateSet;
use crate::core::models::profile::{ProfileError, ScatteringProfile};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("Scattering grid is empty")]
    EmptyGrid,
    #[error("Invalid scattering grid: {0}")]
    InvalidGrid(#[from] ProfileError),
    #[error("Length mismatch for {what}: expected {expected}, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Experimental Q = {q} lies outside the model grid [{min}, {max}]")]
    OutOfRange { q: f64, min: f64, max: f64 },
    #[error("Uncertainty at index {index} must be positive and finite (found {value})")]
    InvalidSigma { index: usize, value: f64 },
    #[error("Coordinate {index} is not finite")]
    NonFiniteCoordinate { index: usize },
    #[error("Predicted intensity at index {index} is not finite")]
    NonFiniteIntensity { index: usize },
    #[error("Scoring backend failed: {0}")]
    Backend(String),
}

/// Predicts scattering curves for conformations and compares them with experiment.
///
/// Implementations must be deterministic and must not panic for finite input.
/// Only [`predict_profile`](ScatteringScorer::predict_profile) is required; the
/// goodness-of-fit defaults to the reduced chi of [`chi::chi`].
pub trait ScatteringScorer: Send + Sync {
    /// Predicted intensity at each value of `q` for the given conformation.
    fn predict_profile(&self, coords: &CoordinateSet, q: &[f64])
    -> Result<Vec<f64>, ScoringError>;

    /// Whether [`chi`](ScatteringScorer::chi) fits an intensity scale factor before comparing.
    fn fit_scale(&self) -> bool {
        true
    }

    /// Discrepancy between an experimental curve and a model curve. Lower is better,
    /// and identical curves on the same grid score exactly zero.
    fn chi(
        &self,
        q: &[f64],
        exp_intensity: &[f64],
        exp_sigma: Option<&[f64]>,
        model_q: &[f64],
        model_intensity: &[f64],
    ) -> Result<f64, ScoringError> {
        chi::chi(
            q,
            exp_intensity,
            exp_sigma,
            model_q,
            model_intensity,
            ChiOptions {
                fit_scale: self.fit_scale(),
            },
        )
    }

    /// Predicts the curve on the experimental grid and scores it.
    fn score(
        &self,
        coords: &CoordinateSet,
        experiment: &ScatteringProfile,
    ) -> Result<(f64, Vec<f64>), ScoringError> {
        let predicted = self.predict_profile(coords, experiment.q())?;
        if predicted.len() != experiment.len() {
            return Err(ScoringError::LengthMismatch {
                what: "predicted intensities",
                expected: experiment.len(),
                found: predicted.len(),
            });
        }
        if let Some(index) = predicted.iter().position(|v| !v.is_finite()) {
            return Err(ScoringError::NonFiniteIntensity { index });
        }
        let chi = self.chi(
            experiment.q(),
            experiment.intensity(),
            experiment.sigma(),
            experiment.q(),
            &predicted,
        )?;
        Ok((chi, predicted))
    }
}

impl<S: ScatteringScorer + ?Sized> ScatteringScorer for &S {
    fn predict_profile(
        &self,
        coords: &CoordinateSet,
        q: &[f64],
    ) -> Result<Vec<f64>, ScoringError> {
        (**self).predict_profile(coords, q)
    }

    fn fit_scale(&self) -> bool {
        (**self).fit_scale()
    }

    fn chi(
        &self,
        q: &[f64],
        exp_intensity: &[f64],
        exp_sigma: Option<&[f64]>,
        model_q: &[f64],
        model_intensity: &[f64],
    ) -> Result<f64, ScoringError> {
        (**self).chi(q, exp_intensity, exp_sigma, model_q, model_intensity)
    }
}
