use super::error::TableError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Defines the interface for reading and writing one kind of CSV table.
///
/// Implementors map between a CSV row schema and an in-memory record type. Row order is
/// preserved in both directions.
pub trait TableFile {
    /// The in-memory type of one table row.
    type Record;

    /// Reads all records from `reader`, stopping after `limit` data rows if given.
    ///
    /// # Errors
    ///
    /// Returns an error if a required column is missing, a value cannot be parsed, or a
    /// record violates the table's own constraints.
    fn read_from(reader: impl Read, limit: Option<usize>)
    -> Result<Vec<Self::Record>, TableError>;

    /// Writes the header row followed by one row per record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the underlying writer fails.
    fn write_to(records: &[Self::Record], writer: impl Write) -> Result<(), TableError>;

    /// Reads all records from the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails. The error carries
    /// the path.
    fn read_from_path<P: AsRef<Path>>(
        path: P,
        limit: Option<usize>,
    ) -> Result<Vec<Self::Record>, TableError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TableError::from(e).at_path(path))?;
        Self::read_from(BufReader::new(file), limit).map_err(|e| e.at_path(path))
    }

    /// Writes all records to the file at `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails. The error carries
    /// the path.
    fn write_to_path<P: AsRef<Path>>(records: &[Self::Record], path: P) -> Result<(), TableError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| TableError::from(e).at_path(path))?;
        Self::write_to(records, BufWriter::new(file)).map_err(|e| e.at_path(path))
    }
}

/// Deserializes CSV rows of type `R` and converts each one with `convert`.
///
/// `convert` receives the 1-based data row number for error reporting.
pub(crate) fn read_rows<R, T, F>(
    reader: impl Read,
    limit: Option<usize>,
    mut convert: F,
) -> Result<Vec<T>, TableError>
where
    R: DeserializeOwned,
    F: FnMut(usize, R) -> Result<T, TableError>,
{
    let mut csv_reader = csv::Reader::from_reader(reader);
    let max_rows = limit.unwrap_or(usize::MAX);
    let mut records = Vec::new();
    for (i, row) in csv_reader.deserialize::<R>().take(max_rows).enumerate() {
        records.push(convert(i + 1, row?)?);
    }
    Ok(records)
}

/// Writes `header` and then one serialized row per item.
pub(crate) fn write_rows<S, I>(header: &[&str], rows: I, writer: impl Write) -> Result<(), TableError>
where
    S: Serialize,
    I: IntoIterator<Item = S>,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(header)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub(crate) fn require_non_empty(row: usize, column: &str, value: &str) -> Result<(), TableError> {
    if value.trim().is_empty() {
        return Err(TableError::InvalidRecord {
            row,
            message: format!("column '{}' must not be empty", column),
        });
    }
    Ok(())
}
