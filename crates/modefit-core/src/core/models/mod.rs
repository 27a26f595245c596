//! # Core Models Module
//!
//! Plain data carried between the numerical stages of the library.
//!
//! ## Key Components
//!
//! - [`coords`] - [`coords::CoordinateSet`], the ordered node positions an elastic network is built from
//! - [`profile`] - [`profile::ScatteringProfile`], an intensity curve on a momentum-transfer grid
//!
//! Both types validate their invariants on construction and are never mutated in place
//! afterwards; deformed conformations and predicted curves are always new values.

pub mod coords;
pub mod profile;
