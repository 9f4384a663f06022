//! Error types for the recorder.
//!
//! The recording operations themselves are total; what can fail is setting
//! the recorder up (configuration, policy construction, binding a socket) and
//! talking to the engine task once it has gone away.
//!
//! # Error Types
//!
//! - [`ConfigError`] - malformed environment configuration
//! - [`PolicyError`] - an invalid title or manifest rule
//! - [`EngineError`] - the engine task stopped or dropped a reply
//! - [`RecorderError`] - top-level error encompassing all of the above

use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::engine::EngineError;
pub use crate::policy::PolicyError;

/// Top-level error type for the recorder.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine task failed: {0}")]
    EngineTask(#[from] tokio::task::JoinError),
}

impl RecorderError {
    /// Returns `true` if the error happened before the server was serving.
    #[must_use]
    pub fn is_startup_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Policy(_) | Self::Io(_))
    }
}

/// A specialized `Result` type for recorder operations.
pub type Result<T> = std::result::Result<T, RecorderError>;
