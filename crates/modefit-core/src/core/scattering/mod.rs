//! # Scattering Module
//!
//! Prediction of small-angle scattering curves and their comparison with experiment.
//!
//! ## Key Components
//!
//! - [`scorer`] - The [`scorer::ScatteringScorer`] contract consumed by the conformational
//!   search, and the [`scorer::ScoringError`] it reports
//! - [`chi`] - Reduced chi with grid interpolation and an optional intensity scale fit
//! - [`debye`] - [`debye::DebyeScorer`], a uniform point-scatterer Debye sum
//!
//! Any other scattering backend plugs in by implementing `ScatteringScorer`; only
//! `predict_profile` is required.

pub mod chi;
pub mod debye;
pub mod scorer;
