//! # Normal Modes Module
//!
//! Eigendecomposition of an elastic-network Hessian into ranked normal modes.
//!
//! The [`solver`] validates the Hessian, diagonalizes it with `nalgebra`'s symmetric
//! eigensolver and separates rigid-body (zero) modes from internal motions. The result is
//! a [`mode::ModeSet`], which also exposes the usual derived quantities: variances, their
//! trace, per-node square fluctuations and the covariance matrix.

pub mod mode;
pub mod solver;
