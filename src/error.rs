//! Error types for NeuroTune metrics
//!
//! Only conditions the pipeline cannot recover from surface here. Decode
//! failures, malformed cells, short tables and numeric edge cases are all
//! handled in place with a fallback value and a diagnostic.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while configuring or running an analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl AnalysisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.into(),
            source,
        }
    }
}
