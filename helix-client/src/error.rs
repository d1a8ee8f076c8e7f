//! Error types for the Helix client

use thiserror::Error;

/// Errors that can occur while issuing a Helix API call
#[derive(Debug, Error)]
pub enum HelixError {
    /// Network or transport level failure (connection refused, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be decoded as JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// The API answered with a non-success status code
    #[error("HTTP {status} calling {url}: {message}")]
    Http {
        status: u16,
        url: String,
        message: String,
    },

    /// The token selected for the call does not carry a required scope
    #[error("Missing scope {scope} for user {user_id:?}")]
    MissingScope {
        scope: String,
        user_id: Option<String>,
    },

    /// The request could not be built (bad base URL or path)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl HelixError {
    /// HTTP status of the failed call, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            HelixError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

impl From<reqwest::Error> for HelixError {
    fn from(error: reqwest::Error) -> Self {
        HelixError::Network(error.to_string())
    }
}

impl From<serde_json::Error> for HelixError {
    fn from(error: serde_json::Error) -> Self {
        HelixError::Parse(error.to_string())
    }
}

impl From<url::ParseError> for HelixError {
    fn from(error: url::ParseError) -> Self {
        HelixError::InvalidRequest(error.to_string())
    }
}
