use crate::core::modes::mode::ModeSet;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// One row of the chi-versus-frame trace of a conformational search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChiTraceRow {
    pub mode: usize,
    pub frame: i64,
    pub coefficient: f64,
    pub chi: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModeRow {
    pub index: usize,
    pub eigenvalue: f64,
    pub variance: Option<f64>,
}

pub fn write_chi_trace<W: Write>(
    writer: W,
    rows: impl IntoIterator<Item = ChiTraceRow>,
) -> Result<(), csv::Error> {
    write_rows(writer, rows)
}

pub fn write_chi_trace_to_path<P: AsRef<Path>>(
    path: P,
    rows: impl IntoIterator<Item = ChiTraceRow>,
) -> Result<(), csv::Error> {
    write_rows(std::fs::File::create(path)?, rows)
}

/// Writes `index,eigenvalue,variance`, leaving the variance empty for zero modes.
pub fn write_mode_table<W: Write>(writer: W, modes: &ModeSet) -> Result<(), csv::Error> {
    write_rows(writer, mode_rows(modes))
}

pub fn write_mode_table_to_path<P: AsRef<Path>>(
    path: P,
    modes: &ModeSet,
) -> Result<(), csv::Error> {
    write_rows(std::fs::File::create(path)?, mode_rows(modes))
}

fn mode_rows(modes: &ModeSet) -> impl Iterator<Item = ModeRow> + '_ {
    modes.iter().enumerate().map(|(index, mode)| ModeRow {
        index,
        eigenvalue: mode.eigenvalue(),
        variance: mode.variance(),
    })
}

fn write_rows<W: Write, R: Serialize>(
    writer: W,
    rows: impl IntoIterator<Item = R>,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
