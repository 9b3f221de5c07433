//! Error types for configuration loading

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while resolving, merging, binding or unmarshalling
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No candidate file exists for a direct read
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read a file that exists
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The target could not be walked for env bindings
    #[error("failed to bind environment for '{key}': {reason}")]
    Bind { key: String, reason: String },

    /// The merged tree did not fit the target type
    #[error("failed to unmarshal configuration: {0}")]
    Unmarshal(Box<figment::Error>),

    /// Loader was called without any file stems
    #[error("have no config file")]
    NoConfigFiles,
}

impl ConfigError {
    /// Whether this error only means the file was absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::FileNotFound { .. })
    }

    pub(crate) fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound { path }
        } else {
            ConfigError::ReadFile { path, source }
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Unmarshal(Box::new(err))
    }
}
