use crate::error::{CliError, Result};
use modefit::core::io::pdb::{PdbFile, PdbStructure};
use modefit::core::io::traits::DataFile;
use modefit::core::models::coords::CoordinateSet;
use std::path::Path;
use tracing::info;

pub mod fit;
pub mod modes;

/// Reads a PDB file and returns the selected atoms together with their coordinates.
fn load_structure(path: &Path, calpha_only: bool) -> Result<(PdbStructure, CoordinateSet)> {
    info!("Loading input structure from {:?}", path);
    let parsing_error = |e: modefit::core::io::pdb::PdbError| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    };

    let structure = PdbFile::read_from_path(path).map_err(parsing_error)?;
    let selected = if calpha_only {
        structure.select_calpha()
    } else {
        structure
    };
    info!(
        atoms = selected.len(),
        calpha_only, "Selected network nodes from input structure."
    );
    let coords = selected.coordinates().map_err(parsing_error)?;
    Ok((selected, coords))
}
