use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// A permission name that is not one of the recognised operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown permission {0:?}")]
pub struct UnknownPermission(pub String);

/// Errors produced while reading, parsing, or normalizing a configuration.
///
/// Every variant is fatal to loading: no partial rule set is ever returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("config file not found: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration path points at a directory.
    #[error("config path {} is a directory", path.display())]
    IsDirectory { path: PathBuf },

    /// Any other I/O failure while reading the file.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML or does not fit the schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yml::Error),

    /// A rule lists a permission token that is not recognised.
    #[error("invalid perms for path {path:?}: unknown permission {token:?}")]
    InvalidPermission { path: String, token: String },

    /// Reading the file did not finish before the deadline.
    #[error("timed out after {timeout:?} reading config file {}", path.display())]
    Timeout { path: PathBuf, timeout: Duration },

    /// No per-user configuration directory could be determined.
    #[error("could not determine the user configuration directory")]
    NoConfigDir,

    /// Dumping the document as JSON failed.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ConfigError {
    /// Classify an I/O error raised for `path`.
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path, source },
            _ => Self::Io { path, source },
        }
    }

    pub(crate) fn invalid_permission(path: impl Into<String>, err: UnknownPermission) -> Self {
        Self::InvalidPermission {
            path: path.into(),
            token: err.0,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
