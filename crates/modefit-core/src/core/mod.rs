//! # Core Module
//!
//! Stateless data models and pure numerical algorithms. Nothing in this layer keeps
//! state between calls; orchestration lives in [`crate::engine`].
//!
//! ## Architecture
//!
//! - **Data** ([`models`]) - Coordinate sets and scattering profiles
//! - **Elastic networks** ([`network`]) - Spring-constant models, contact search and
//!   Hessian/Kirchhoff construction
//! - **Normal modes** ([`modes`]) - Eigendecomposition into ranked modes and their statistics
//! - **Scattering** ([`scattering`]) - The scorer contract, reduced chi and a Debye reference scorer
//! - **File I/O** ([`io`]) - PDB coordinates, profile tables and CSV reports

pub mod io;
pub mod models;
pub mod modes;
pub mod network;
pub mod scattering;
