//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing the configuration file.
///
/// Readers fall back to defaults on any of these; they are logged, never
/// surfaced to the control surface.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    /// The file could not be read or written.
    #[error("configuration I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("invalid configuration in {path}: {source}")]
    Parse {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The store has no backing file.
    #[error("configuration store is not backed by a file")]
    NoBackingFile,
}

impl ConfigError {
    /// Returns true if the error just means "no file yet".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
