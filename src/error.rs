//! Error types.
//!
//! Detection itself is infallible; only configuration loading can fail.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a [`FormGuardConfig`](crate::FormGuardConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON configuration did not parse.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration did not parse.
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A field holds a value the engine cannot run with.
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
