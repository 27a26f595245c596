use crate::core::io::traits::DataFile;
use crate::core::models::coords::{CoordinateError, CoordinateSet};
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Atom,
    Hetatm,
}

impl RecordKind {
    fn tag(self) -> &'static str {
        match self {
            RecordKind::Atom => "ATOM",
            RecordKind::Hetatm => "HETATM",
        }
    }
}

/// One coordinate record of a PDB file.
#[derive(Debug, Clone, PartialEq)]
pub struct PdbAtom {
    pub record: RecordKind,
    pub serial: usize,
    pub name: String,
    pub alt_loc: char,
    pub res_name: String,
    pub chain_id: char,
    pub res_seq: isize,
    pub i_code: char,
    pub position: Point3<f64>,
    pub occupancy: f64,
    pub temp_factor: f64,
    pub element: String,
}

/// The coordinate records of the first model of a PDB file, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdbStructure {
    atoms: Vec<PdbAtom>,
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("No matching ATOM/HETATM records were found")]
    NoAtoms,
    #[error("Structure has {expected} atoms but {found} coordinates were supplied")]
    AtomCountMismatch { expected: usize, found: usize },
    #[error(transparent)]
    Coordinates(#[from] CoordinateError),
}

#[derive(Debug, Error, PartialEq)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: &'static str, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: &'static str, value: String },
    #[error("Line is too short for an ATOM/HETATM record (must reach column 54)")]
    LineTooShort,
}

impl PdbStructure {
    pub fn new(atoms: Vec<PdbAtom>) -> Self {
        Self { atoms }
    }

    pub fn atoms(&self) -> &[PdbAtom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Keeps the atoms matching `predicate`, preserving order.
    pub fn select(&self, predicate: impl Fn(&PdbAtom) -> bool) -> PdbStructure {
        PdbStructure {
            atoms: self.atoms.iter().filter(|a| predicate(a)).cloned().collect(),
        }
    }

    /// Protein C-alpha atoms, one node per residue for a coarse-grained network.
    pub fn select_calpha(&self) -> PdbStructure {
        self.select(|a| a.record == RecordKind::Atom && a.name == "CA")
    }

    pub fn coordinates(&self) -> Result<CoordinateSet, PdbError> {
        if self.atoms.is_empty() {
            return Err(PdbError::NoAtoms);
        }
        Ok(CoordinateSet::new(
            self.atoms.iter().map(|a| a.position).collect(),
        )?)
    }

    /// Returns a copy with every position replaced, in atom order.
    pub fn with_coordinates(&self, coords: &CoordinateSet) -> Result<PdbStructure, PdbError> {
        if coords.len() != self.atoms.len() {
            return Err(PdbError::AtomCountMismatch {
                expected: self.atoms.len(),
                found: coords.len(),
            });
        }
        let atoms = self
            .atoms
            .iter()
            .zip(coords.points())
            .map(|(atom, position)| PdbAtom {
                position: *position,
                ..atom.clone()
            })
            .collect();
        Ok(PdbStructure { atoms })
    }
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn column_char(line: &str, index: usize) -> char {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .unwrap_or(' ')
}

fn parse_float(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    columns: &'static str,
) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns,
            value: value.into(),
        },
    })
}

fn parse_optional_float(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    columns: &'static str,
    default: f64,
) -> Result<f64, PdbError> {
    if slice_and_trim(line, start, end).is_empty() {
        Ok(default)
    } else {
        parse_float(line, line_num, start, end, columns)
    }
}

pub struct PdbFile;

impl DataFile for PdbFile {
    type Data = PdbStructure;
    type ReadOptions = ();
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead, _options: &()) -> Result<PdbStructure, PdbError> {
        let mut atoms = Vec::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            let record = match slice_and_trim(&line, 0, 6) {
                "ATOM" => RecordKind::Atom,
                "HETATM" => RecordKind::Hetatm,
                "ENDMDL" => break,
                _ => continue,
            };
            if line.len() < 54 {
                return Err(PdbError::Parse {
                    line: line_num,
                    kind: PdbParseErrorKind::LineTooShort,
                });
            }

            let alt_loc = column_char(&line, 16);
            if alt_loc != ' ' && alt_loc != 'A' {
                continue;
            }

            let serial_str = slice_and_trim(&line, 6, 11);
            let serial: usize = serial_str.parse().map_err(|_| PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::InvalidInt {
                    columns: "7-11",
                    value: serial_str.into(),
                },
            })?;
            let res_seq_str = slice_and_trim(&line, 22, 26);
            let res_seq: isize = res_seq_str.parse().map_err(|_| PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::InvalidInt {
                    columns: "23-26",
                    value: res_seq_str.into(),
                },
            })?;

            let x = parse_float(&line, line_num, 30, 38, "31-38")?;
            let y = parse_float(&line, line_num, 38, 46, "39-46")?;
            let z = parse_float(&line, line_num, 46, 54, "47-54")?;
            let occupancy = parse_optional_float(&line, line_num, 54, 60, "55-60", 1.0)?;
            let temp_factor = parse_optional_float(&line, line_num, 60, 66, "61-66", 0.0)?;

            atoms.push(PdbAtom {
                record,
                serial,
                name: slice_and_trim(&line, 12, 16).to_string(),
                alt_loc,
                res_name: slice_and_trim(&line, 17, 20).to_string(),
                chain_id: column_char(&line, 21),
                res_seq,
                i_code: column_char(&line, 26),
                position: Point3::new(x, y, z),
                occupancy,
                temp_factor,
                element: slice_and_trim(&line, 76, 78).to_string(),
            });
        }

        if atoms.is_empty() {
            return Err(PdbError::NoAtoms);
        }
        Ok(PdbStructure { atoms })
    }

    fn write_to(structure: &PdbStructure, writer: &mut impl Write) -> Result<(), PdbError> {
        for atom in structure.atoms() {
            // Names shorter than four characters start in column 14.
            let name = if atom.name.len() < 4 {
                format!(" {:<3}", atom.name)
            } else {
                atom.name.clone()
            };
            writeln!(
                writer,
                "{:<6}{:>5} {:<4}{}{:>3} {}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                atom.record.tag(),
                atom.serial % 100_000,
                name,
                atom.alt_loc,
                atom.res_name,
                atom.chain_id,
                atom.res_seq,
                atom.i_code,
                atom.position.x,
                atom.position.y,
                atom.position.z,
                atom.occupancy,
                atom.temp_factor,
                atom.element,
            )?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}
