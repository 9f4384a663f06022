//! Error types for the handoff client.

use thiserror::Error;

/// Errors that can occur while moving an export into the backend.
#[derive(Error, Debug)]
pub enum HandoffError {
    /// HTTP request failed for a reason other than a retryable one.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote side rejected the request (4xx).
    #[error("request rejected: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// The remote side kept failing (5xx) until retries ran out.
    #[error("server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Connection errors persisted until retries ran out.
    #[error("max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded { attempts: u32 },

    /// The export has no lessons, so there is nothing to create.
    #[error("export for '{name}' has no lessons")]
    EmptyExport { name: String },

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HandoffError {
    /// Returns `true` for failures that another attempt might fix.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ServerError { .. } | Self::MaxRetriesExceeded { .. }
        )
    }
}
