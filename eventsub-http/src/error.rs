//! Error types for the HTTP front-end

use thiserror::Error;

/// Errors returned by [`crate::EventSubHttpListener`] lifecycle calls
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpListenerError {
    #[error("HTTP listener is already running")]
    AlreadyRunning,

    #[error("HTTP listener is not running")]
    NotRunning,

    #[error("Failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },

    #[error("Server task ended before reporting readiness")]
    ServerGone,
}

pub type Result<T> = std::result::Result<T, HttpListenerError>;
