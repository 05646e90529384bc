//! Error handling for direct uploads
//!
//! This module defines the error types surfaced by upload sessions. Transient
//! storage failures never reach this type; they are retried inside the session.

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, DirectUploadError>;

/// Error types that can occur while driving a direct upload
#[derive(Error, Debug)]
pub enum DirectUploadError {
    /// The file would exceed the account's storage quota
    #[error("{message}")]
    QuotaExceeded { message: String },

    /// The upload failed with a non-retryable error
    #[error("{message}")]
    UploadFailed { message: String },

    /// A retry cap was configured and reached
    #[error("{message} (gave up after {attempts} retries)")]
    RetriesExhausted { message: String, attempts: u32 },

    /// Invalid parameter
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DirectUploadError {
    /// Create a new quota exceeded error
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        DirectUploadError::QuotaExceeded {
            message: message.into(),
        }
    }

    /// Create a new upload failure
    pub fn upload_failed(message: impl Into<String>) -> Self {
        DirectUploadError::UploadFailed {
            message: message.into(),
        }
    }

    /// Create a new retries exhausted error
    pub fn retries_exhausted(message: impl Into<String>, attempts: u32) -> Self {
        DirectUploadError::RetriesExhausted {
            message: message.into(),
            attempts,
        }
    }

    /// Create a new invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        DirectUploadError::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}
