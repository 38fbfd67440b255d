//! Error types for idlestop

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for idlestop operations
///
/// Any of these aborts the current evaluation. No shutdown decision is
/// produced, so the machine stays up.
#[derive(Debug, Error)]
pub enum IdlestopError {
    #[error("Marker directory {} is missing or unreadable: {source}", path.display())]
    MarkerDirectoryMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed marker '{name}' ({}): expected a non-negative integer, found {contents:?}", path.display())]
    MalformedMarker {
        name: String,
        path: PathBuf,
        contents: String,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Host error: {0}")]
    HostError(String),
}

impl IdlestopError {
    pub fn directory_missing(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::MarkerDirectoryMissing {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        contents: impl Into<String>,
    ) -> Self {
        Self::MalformedMarker {
            name: name.into(),
            path: path.into(),
            contents: contents.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn host(msg: impl Into<String>) -> Self {
        Self::HostError(msg.into())
    }
}

pub type IdlestopResult<T> = Result<T, IdlestopError>;
