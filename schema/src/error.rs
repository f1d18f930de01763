//! Error types for schema loading.

use std::path::PathBuf;

use modelkit_core::{ModelError, SchemaError};
use thiserror::Error;

/// Errors that can occur while loading or saving schema artifacts.
#[derive(Debug, Error)]
pub enum SchemaLoadError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The file extension is not one of `json`, `yaml` or `yml`.
    #[error("unsupported schema file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The document targets an incompatible schema contract.
    #[error("incompatible schema contract version {found} (supported: {supported})")]
    IncompatibleVersion {
        /// Version declared by the document.
        found: String,
        /// Version this build understands.
        supported: String,
    },

    /// Loaded types failed structural verification.
    #[error("invalid schema: {}", render(.0))]
    InvalidSchema(Vec<SchemaError>),

    /// Registering a type failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// All configured loader sources failed.
    #[error("no schema sources available")]
    NoSourcesAvailable,

    /// A process-wide registry is already installed.
    #[error("a global schema registry is already installed")]
    AlreadyInstalled,
}

impl SchemaLoadError {
    /// Maps a registration failure, keeping schema violations as
    /// [`SchemaLoadError::InvalidSchema`].
    pub(crate) fn registration(err: ModelError) -> Self {
        match err {
            ModelError::InvalidSchema(errors) => Self::InvalidSchema(errors),
            other => Self::Model(other),
        }
    }
}

/// Convenience alias for results with [`SchemaLoadError`].
pub type Result<T> = std::result::Result<T, SchemaLoadError>;

fn render(errors: &[SchemaError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
