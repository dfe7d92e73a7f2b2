use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed table: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid record on data row {row}: {message}")]
    InvalidRecord { row: usize, message: String },
    #[error("Table '{path}': {source}", path = path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<TableError>,
    },
}

impl TableError {
    /// Attaches the file path to an error raised while reading or writing it.
    pub fn at_path(self, path: &Path) -> Self {
        match self {
            TableError::File { .. } => self,
            other => TableError::File {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }
}
