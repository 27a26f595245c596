//! Provides input/output for the file formats the tools exchange.
//!
//! Structures come in and go out as PDB coordinate records ([`pdb`]), experimental
//! and predicted scattering curves as `Q I [sigma]` tables ([`profile`]), and
//! search traces and mode listings as CSV ([`tables`]). The text formats share the
//! [`traits::DataFile`] interface.

pub mod pdb;
pub mod profile;
pub mod tables;
pub mod traits;
