use super::cache::CacheError;
use super::config::ConfigError;
use crate::core::io::error::TableError;
use crate::core::models::element::UnknownElementError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    UnknownElement(#[from] UnknownElementError),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Unknown feature '{0}'")]
    UnknownFeature(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Table error: {source}")]
    Table {
        #[from]
        source: TableError,
    },

    #[error("Cache error: {source}")]
    Cache {
        #[from]
        source: CacheError,
    },

    #[error("Study file error for '{path}': {message}")]
    Study { path: String, message: String },
}
