//! # Modefit Core Library
//!
//! Anisotropic network model (ANM) normal modes of macromolecular structures, and a
//! mode-guided search for the conformation whose predicted small-angle scattering
//! profile best matches an experimental curve.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`CoordinateSet`,
//!   `ScatteringProfile`), the Hessian builder, the mode solver, the scattering
//!   scorer contract and file I/O.
//!
//! - **[`engine`]: The Logic Core.** Validated configuration, error types, progress
//!   reporting, cancellation, the stateful `Anm` facade and the conformational search.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures that tie the two layers
//!   together, such as [`workflows::fit::run`].

pub mod core;
pub mod engine;
pub mod workflows;
