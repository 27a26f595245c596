//! # Elastic Network Module
//!
//! Construction of the anisotropic network model (ANM) from a set of node coordinates.
//!
//! ## Overview
//!
//! Nodes closer than a cutoff distance are joined by harmonic springs. The resulting
//! potential has a 3N x 3N Hessian built from 3x3 super-elements, and an N x N
//! Kirchhoff (contact) matrix recording the spring constants of each contact.
//!
//! ## Key Components
//!
//! - [`gamma`] - Pairwise spring-constant models ([`gamma::GammaModel`], [`gamma::Gamma`])
//! - [`neighbors`] - Contact enumeration by brute-force scan or k-d tree
//! - [`storage`] - Dense or sparse matrix storage behind a single [`storage::NetworkMatrix`] type
//! - [`hessian`] - The builder producing an [`hessian::ElasticNetwork`]
//!
//! ## Usage
//!
//! ```ignore
//! use modefit::core::network::{gamma::GammaModel, hessian};
//!
//! let network = hessian::build(&coords, 15.0, &GammaModel::Constant(1.0), Default::default())?;
//! let kirchhoff = network.kirchhoff();
//! ```

pub mod gamma;
pub mod hessian;
pub mod neighbors;
pub mod storage;
