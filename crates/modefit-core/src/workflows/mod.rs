//! # Workflows Module
//!
//! End-to-end entry points built from the [`crate::engine`] and [`crate::core`] layers.
//!
//! - **Fit Workflow** ([`fit`]) - Network, modes and the scattering-guided conformational search
//! - **Mode Workflow** ([`modes`]) - Network and modes only, for inspecting a structure's dynamics
//!
//! Each workflow reports its phases through a [`crate::engine::progress::ProgressReporter`]
//! and logs through `tracing`.

pub mod fit;
pub mod modes;
