use crate::core::io::traits::DataFile;
use crate::core::models::profile::{ProfileError, ScatteringProfile};
use std::f64::consts::LN_10;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileReadOptions {
    /// The intensity column (and its uncertainty) holds `log10` values.
    pub log_scale: bool,
}

#[derive(Debug, Error)]
pub enum ProfileFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: ProfileParseErrorKind,
    },
    #[error("Line {line} has {found} columns but earlier rows have {expected}")]
    InconsistentColumns {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

#[derive(Debug, Error, PartialEq)]
pub enum ProfileParseErrorKind {
    #[error("Expected at least Q and I columns")]
    TooFewColumns,
    #[error("Invalid number in column {column} (value: '{value}')")]
    InvalidFloat { column: usize, value: String },
}

/// Whitespace-separated `Q I [sigma]` tables.
///
/// Blank lines and lines starting with `#` are skipped. Either every data row
/// carries an uncertainty column or none does; extra columns are ignored.
pub struct ProfileFile;

impl DataFile for ProfileFile {
    type Data = ScatteringProfile;
    type ReadOptions = ProfileReadOptions;
    type Error = ProfileFileError;

    fn read_from(
        reader: &mut impl BufRead,
        options: &ProfileReadOptions,
    ) -> Result<ScatteringProfile, ProfileFileError> {
        let mut q = Vec::new();
        let mut intensity = Vec::new();
        let mut sigma = Vec::new();
        let mut has_sigma: Option<bool> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            if fields.len() < 2 {
                return Err(ProfileFileError::Parse {
                    line: line_num,
                    kind: ProfileParseErrorKind::TooFewColumns,
                });
            }
            let row_has_sigma = fields.len() >= 3;
            match has_sigma {
                None => has_sigma = Some(row_has_sigma),
                Some(expected) if expected != row_has_sigma => {
                    return Err(ProfileFileError::InconsistentColumns {
                        line: line_num,
                        expected: if expected { 3 } else { 2 },
                        found: fields.len(),
                    });
                }
                Some(_) => {}
            }

            let parse = |column: usize| -> Result<f64, ProfileFileError> {
                fields[column].parse().map_err(|_| ProfileFileError::Parse {
                    line: line_num,
                    kind: ProfileParseErrorKind::InvalidFloat {
                        column: column + 1,
                        value: fields[column].into(),
                    },
                })
            };

            let row_q = parse(0)?;
            let mut row_i = parse(1)?;
            let mut row_sigma = if row_has_sigma { Some(parse(2)?) } else { None };
            if options.log_scale {
                row_i = 10f64.powf(row_i);
                row_sigma = row_sigma.map(|s| row_i * LN_10 * s);
            }

            q.push(row_q);
            intensity.push(row_i);
            if let Some(s) = row_sigma {
                sigma.push(s);
            }
        }

        let sigma = has_sigma.unwrap_or(false).then_some(sigma);
        Ok(ScatteringProfile::new(q, intensity, sigma)?)
    }

    fn write_to(
        profile: &ScatteringProfile,
        writer: &mut impl Write,
    ) -> Result<(), ProfileFileError> {
        match profile.sigma() {
            Some(_) => writeln!(writer, "# Q I sigma")?,
            None => writeln!(writer, "# Q I")?,
        }
        for (q, intensity, sigma) in profile.iter() {
            match sigma {
                Some(s) => writeln!(writer, "{:.6e} {:.6e} {:.6e}", q, intensity, s)?,
                None => writeln!(writer, "{:.6e} {:.6e}", q, intensity)?,
            }
        }
        Ok(())
    }
}
