//! Error type definitions for the catalog manager
//!
//! Every failure an operation can report is one of the variants below. The web
//! layer maps them onto status codes; nothing here is fatal to the process.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Missing or empty required fields, or an import without a document
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Uploaded document that could not be parsed as an entry list
    #[error("Unreadable input: {message}")]
    UnreadableInput { message: String },

    /// Failures touching the backing document on disk
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Failures encoding the collection
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error for a specific resource
    pub fn not_found<R: Into<String>, I: ToString>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// Create an unreadable input error
    pub fn unreadable_input<S: Into<String>>(message: S) -> Self {
        Self::UnreadableInput {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error is caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Validation { .. } | Self::UnreadableInput { .. }
        )
    }
}
