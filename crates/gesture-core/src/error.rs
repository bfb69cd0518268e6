use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GestureError {
    #[error("invalid landmark frame: expected {expected} points, got {actual}")]
    InvalidInput { expected: usize, actual: usize },
}

/// Failure to read a rule or binding source. Callers recover with an empty collection.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid entry '{name}': {reason}")]
    InvalidEntry { name: String, reason: String },
}

impl ConfigLoadError {
    pub(crate) fn from_io(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigLoadError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigLoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}
