//! Custom error types for planmark.
//!
//! Library operations return [`PlanmarkError`]; the binary wraps them in
//! `anyhow` and maps them to an exit status with [`PlanmarkError::exit_code`].

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for planmark operations
#[derive(Error, Debug)]
pub enum PlanmarkError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    /// Missing project directory or required file
    #[error("Missing required file: {path}")]
    MissingFile { path: PathBuf },

    // =========================================================================
    // Detector Errors
    // =========================================================================
    /// The persisted progress state could not be parsed
    #[error("Progress state at {path} is corrupt: {reason}")]
    StateCorrupt { path: PathBuf, reason: String },

    /// Lock on the progress state could not be taken
    #[error("Failed to lock progress state: {message}")]
    StateLock { message: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlanmarkError {
    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create an invalid configuration error for a single field
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a corrupt state error
    pub fn state_corrupt(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::StateCorrupt {
            path,
            reason: reason.into(),
        }
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StateCorrupt { .. } | Self::StateLock { .. } => 3,
            Self::MissingFile { .. } => 6,
            Self::Config { .. } | Self::InvalidConfig { .. } => 7,
            _ => 1,
        }
    }
}

/// Type alias for planmark results
pub type Result<T> = std::result::Result<T, PlanmarkError>;
