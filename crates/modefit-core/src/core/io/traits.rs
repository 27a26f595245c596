use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing one on-disk data format.
///
/// Implementors handle format-specific parsing and serialization; the path
/// helpers wrap them in buffered file handles.
pub trait DataFile {
    /// The in-memory value read from and written to the format.
    type Data;

    /// Reader settings that change how the file is interpreted.
    type ReadOptions: Default;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Parses a value from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the reader fails.
    fn read_from(
        reader: &mut impl BufRead,
        options: &Self::ReadOptions,
    ) -> Result<Self::Data, Self::Error>;

    /// Serializes a value to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(data: &Self::Data, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a value from a file path with the given options.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path_with<P: AsRef<Path>>(
        path: P,
        options: &Self::ReadOptions,
    ) -> Result<Self::Data, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader, options)
    }

    /// Reads a value from a file path with default options.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self::Data, Self::Error> {
        Self::read_from_path_with(path, &Self::ReadOptions::default())
    }

    /// Writes a value to a file path, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(data: &Self::Data, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(data, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
