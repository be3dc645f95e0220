//! Error types for the collision index
//!
//! Provides error handling for:
//! - Storage backend failures
//! - Configuration loading

use disambig_core::PriorityError;
use std::path::PathBuf;

/// Errors reported by a storage backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Storage could not be reached
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Stored record could not be decoded
    #[error("corrupt record for page {id}: {message}")]
    CorruptRecord {
        /// Page id of the record
        id: u64,
        /// What was wrong with it
        message: String,
    },
}

impl BackendError {
    /// Create corrupt record error
    pub fn corrupt(id: u64, message: impl Into<String>) -> Self {
        Self::CorruptRecord {
            id,
            message: message.into(),
        }
    }
}

/// Errors during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or shape error
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Priority table could not be built
    #[error("invalid priorities: {0}")]
    Priority(#[from] PriorityError),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Error of an index operation
///
/// Configuration problems surface at construction as [`ConfigError`] and
/// tag validation happens before a request reaches the index, so only
/// storage can fail here.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Storage failure
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;
