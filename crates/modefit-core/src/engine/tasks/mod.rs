//! Computational units of the conformational search.
//!
//! [`interpolation`] defines the frame grid and displacement amplitude along a mode;
//! [`search`] runs the exhaustive mode-by-frame evaluation and keeps the best fit.

pub mod interpolation;
pub mod search;
