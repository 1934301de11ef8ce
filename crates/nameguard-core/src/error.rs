use std::path::PathBuf;
use thiserror::Error;

/// Core error type for nameguard operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {source}")]
    ConfigParse {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read name cache at {path}: {source}")]
    CacheRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse name cache at {path}: {source}")]
    CacheParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write name cache at {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Failed to print {path}: {message}")]
    Print { path: String, message: String },

    #[error("Invalid keep pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Every candidate the generator produced was rejected. The generator
    /// range is unbounded, so this indicates a broken reservation policy.
    #[error("No acceptable name for `{original}` after {attempts} candidates")]
    NameSpaceExhausted { original: String, attempts: usize },

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Whether the project driver may skip the current file and continue.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
