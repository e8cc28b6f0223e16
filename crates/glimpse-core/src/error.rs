//! Error types for the Glimpse classification pipeline.
//!
//! Errors are organized by stage so the session controller can map every
//! failure onto a [`FailureKind`] the presentation layer knows how to show.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for Glimpse operations.
#[derive(Error, Debug)]
pub enum GlimpseError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline errors, one variant per stage that can fail.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// The file picker produced no file
    #[error("No image selected")]
    NoImageSelected,

    /// A drop payload contained nothing with an `image/*` type
    #[error("Dropped item is not an image (type: {mime_type})")]
    UnsupportedDropItem { mime_type: String },

    /// The picked file could not be read
    #[error("Cannot read {path}: {message}")]
    Unreadable { path: PathBuf, message: String },

    /// The picked file exceeds the configured size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image decoding failed
    #[error("Decode error for {source_name}: {message}")]
    Decode {
        source_name: String,
        message: String,
    },

    /// A classification was requested before the model reached `Ready`
    #[error("Model not ready (status: {status})")]
    ModelNotReady { status: String },

    /// Loading the model failed
    #[error("Model load failed for {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },

    /// The model failed while classifying, or returned malformed output
    #[error("Inference failed: {message}")]
    Inference { message: String },
}

/// Failure categories surfaced in the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NoImageSelected,
    UnsupportedDropItem,
    DecodeFailure,
    ModelNotReady,
    InferenceFailure,
    ModelLoadFailure,
}

impl FailureKind {
    /// Short human-readable label for inline failure indicators.
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::NoImageSelected => "No image selected",
            FailureKind::UnsupportedDropItem => "Not an image",
            FailureKind::DecodeFailure => "Could not decode image",
            FailureKind::ModelNotReady => "Model is still loading",
            FailureKind::InferenceFailure => "Classification failed",
            FailureKind::ModelLoadFailure => "Model failed to load",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl PipelineError {
    /// The failure category this error is reported under.
    ///
    /// File-level problems on the picker side count as "no image selected":
    /// the picker never produced a usable resource.
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::NoImageSelected
            | PipelineError::Unreadable { .. }
            | PipelineError::FileTooLarge { .. } => FailureKind::NoImageSelected,
            PipelineError::UnsupportedDropItem { .. } => FailureKind::UnsupportedDropItem,
            PipelineError::Decode { .. } => FailureKind::DecodeFailure,
            PipelineError::ModelNotReady { .. } => FailureKind::ModelNotReady,
            PipelineError::ModelLoad { .. } => FailureKind::ModelLoadFailure,
            PipelineError::Inference { .. } => FailureKind::InferenceFailure,
        }
    }
}

/// Convenience type alias for Glimpse results.
pub type Result<T> = std::result::Result<T, GlimpseError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
