//! Error types for the upload session manager
//!
//! Errors are split by concern. Per-file failures (transport, preview) are
//! recorded on the file they belong to and never escape the session; only
//! caller misuse (`SessionError`) is returned from session operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::app::models::{FileId, FileStatus};

/// Caller-misuse errors returned by session operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Operation not allowed in the entry's current state
    #[error("Invalid state for {id}: file is {status}. {reason}")]
    InvalidState {
        id: FileId,
        status: FileStatus,
        reason: String,
    },

    /// Operation referenced an id that is not tracked by the session
    #[error("File not found in session: {id}")]
    NotFound { id: FileId },
}

/// Transport-side failures
///
/// These are converted into [`crate::app::models::UploadOutcome::Failure`]
/// before the session sees them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transfer failed with a human-readable message
    #[error("{message}")]
    Failed { message: String },

    /// The transfer was interrupted before it could resolve
    #[error("Upload interrupted before completion")]
    Interrupted,
}

/// Preview generation failures (always swallowed by the session)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    /// Payload has no bytes to encode
    #[error("Cannot build preview from an empty payload")]
    EmptyPayload,

    /// Payload exceeds the preview byte limit
    #[error("Payload of {size} bytes exceeds preview limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
}

/// Submission validation failures, reported per rejected file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    /// File is larger than the configured limit
    #[error("{name}: File size {size} bytes exceeds the {limit} byte limit")]
    TooLarge { name: String, size: u64, limit: u64 },

    /// File type is not in the allowed list
    #[error("{name}: File type not supported ({media_type})")]
    UnsupportedType { name: String, media_type: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// User configuration directory could not be determined
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Session misuse
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Transport failure surfaced outside a session (CLI only)
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Submission rejected
    #[error(transparent)]
    Intake(#[from] IntakeError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable by retrying
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Transport(TransportError::Failed { .. })
            | AppError::Transport(TransportError::Interrupted) => true,

            AppError::Session(_)
            | AppError::Intake(_)
            | AppError::Config(_)
            | AppError::Json(_) => false,

            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Session(_) => "session",
            AppError::Transport(_) => "transport",
            AppError::Intake(_) => "intake",
            AppError::Config(_) => "config",
            AppError::Json(_) => "json",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Session result type alias
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Preview result type alias
pub type PreviewResult<T> = std::result::Result<T, PreviewError>;

/// Config result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
