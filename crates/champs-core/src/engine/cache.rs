use crate::core::io::error::TableError;
use crate::core::io::traits::TableFile;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Invalid cache key '{0}': keys may only contain ASCII letters, digits, '-', '_' and '.'")]
    InvalidKey(String),
    #[error("Cache I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Cached table '{key}' could not be read or written: {source}")]
    Table {
        key: String,
        #[source]
        source: TableError,
    },
}

/// A name-addressed store of intermediate tables.
///
/// Keys name a pipeline stage (e.g. `structures_bonds`), not the content that produced
/// the table; callers are responsible for invalidating stale entries.
pub trait TableCache {
    /// Returns the cached table stored under `key`, or `None` if there is none.
    fn load<T: TableFile>(&self, key: &str) -> Result<Option<Vec<T::Record>>, CacheError>;

    /// Stores `records` under `key`, replacing any previous entry.
    fn store<T: TableFile>(&self, key: &str, records: &[T::Record]) -> Result<(), CacheError>;
}

/// A cache that never holds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl TableCache for NoCache {
    fn load<T: TableFile>(&self, _key: &str) -> Result<Option<Vec<T::Record>>, CacheError> {
        Ok(None)
    }

    fn store<T: TableFile>(&self, _key: &str, _records: &[T::Record]) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Stores each table as `<dir>/<key>.csv`.
#[derive(Debug, Clone)]
pub struct CsvTableCache {
    dir: PathBuf,
}

impl CsvTableCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, CacheError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.csv", key)))
    }

    /// Removes the entry stored under `key`. Returns whether an entry existed.
    pub fn invalidate(&self, key: &str) -> Result<bool, CacheError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

impl TableCache for CsvTableCache {
    fn load<T: TableFile>(&self, key: &str) -> Result<Option<Vec<T::Record>>, CacheError> {
        let path = self.path_for(key)?;
        if !path.is_file() {
            debug!(key, "Cache miss.");
            return Ok(None);
        }
        let records = T::read_from_path(&path, None).map_err(|source| CacheError::Table {
            key: key.to_string(),
            source,
        })?;
        info!(key, rows = records.len(), "Loaded table from cache.");
        Ok(Some(records))
    }

    fn store<T: TableFile>(&self, key: &str, records: &[T::Record]) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;

        let staging = self.dir.join(format!(".{}.csv.tmp", key));
        T::write_to_path(records, &staging).map_err(|source| CacheError::Table {
            key: key.to_string(),
            source,
        })?;
        fs::rename(&staging, &path).map_err(|e| io_error(&path, e))?;
        info!(key, rows = records.len(), "Stored table in cache.");
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<(), CacheError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidKey(key.to_string()))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::submission::{SubmissionFile, SubmissionRow};
    use tempfile::tempdir;

    fn rows() -> Vec<SubmissionRow> {
        vec![
            SubmissionRow {
                id: 1,
                scalar_coupling_constant: 84.8,
            },
            SubmissionRow {
                id: 2,
                scalar_coupling_constant: -11.25,
            },
        ]
    }

    #[test]
    fn missing_entry_is_a_miss() {
        let dir = tempdir().unwrap();
        let cache = CsvTableCache::new(dir.path());
        assert!(cache.load::<SubmissionFile>("absent").unwrap().is_none());
    }

    #[test]
    fn stored_table_is_loaded_back() {
        let dir = tempdir().unwrap();
        let cache = CsvTableCache::new(dir.path().join("nested"));
        cache.store::<SubmissionFile>("predictions", &rows()).unwrap();

        assert!(dir.path().join("nested/predictions.csv").is_file());
        let loaded = cache.load::<SubmissionFile>("predictions").unwrap().unwrap();
        assert_eq!(loaded, rows());
    }

    #[test]
    fn store_replaces_previous_entry() {
        let dir = tempdir().unwrap();
        let cache = CsvTableCache::new(dir.path());
        cache.store::<SubmissionFile>("stage", &rows()).unwrap();
        cache.store::<SubmissionFile>("stage", &rows()[..1]).unwrap();
        assert_eq!(cache.load::<SubmissionFile>("stage").unwrap().unwrap().len(), 1);
    }

    #[test]
    fn invalidate_removes_entry() {
        let dir = tempdir().unwrap();
        let cache = CsvTableCache::new(dir.path());
        cache.store::<SubmissionFile>("stage", &rows()).unwrap();
        assert!(cache.invalidate("stage").unwrap());
        assert!(!cache.invalidate("stage").unwrap());
        assert!(cache.load::<SubmissionFile>("stage").unwrap().is_none());
    }

    #[test]
    fn unsafe_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let cache = CsvTableCache::new(dir.path());
        for key in ["", "../escape", "a/b", ".hidden", "spaced key"] {
            assert!(
                matches!(cache.path_for(key), Err(CacheError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
        assert!(cache.path_for("structures_bonds.v2").is_ok());
    }

    #[test]
    fn corrupt_entry_reports_table_error() {
        let dir = tempdir().unwrap();
        let cache = CsvTableCache::new(dir.path());
        fs::write(dir.path().join("broken.csv"), "id,scalar_coupling_constant\nx,1.0\n").unwrap();
        let result = cache.load::<SubmissionFile>("broken");
        assert!(matches!(result, Err(CacheError::Table { .. })));
    }

    #[test]
    fn no_cache_never_hits() {
        let cache = NoCache;
        cache.store::<SubmissionFile>("stage", &rows()).unwrap();
        assert!(cache.load::<SubmissionFile>("stage").unwrap().is_none());
    }
}
