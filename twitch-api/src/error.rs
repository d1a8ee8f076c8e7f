use helix_client::HelixError;
use thiserror::Error;

/// High-level API errors for Helix endpoint methods
///
/// Transport and status failures from the call layer are carried unchanged
/// in [`ApiError::Helix`] so callers can still inspect the HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The underlying Helix call failed
    #[error(transparent)]
    Helix(#[from] HelixError),

    /// The response arrived but did not have the expected shape
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A call that must return data returned nothing
    #[error("Empty response from {0}")]
    EmptyResponse(String),

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ApiError {
    /// HTTP status of the failed call, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Helix(e) => e.status(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::ParseError(error.to_string())
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helix_error_keeps_status() {
        let error: ApiError = HelixError::Http {
            status: 403,
            url: "https://api.twitch.tv/helix/eventsub/subscriptions".to_string(),
            message: "missing scope".to_string(),
        }
        .into();

        assert_eq!(error.status(), Some(403));
        assert!(error.to_string().contains("missing scope"));
    }

    #[test]
    fn test_parse_error_has_no_status() {
        let error = ApiError::ParseError("missing data".to_string());
        assert_eq!(error.status(), None);
        assert_eq!(error.to_string(), "Parse error: missing data");
    }
}
