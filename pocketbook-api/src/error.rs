//! API error types.

use pocketbook_core::CoreError;
use pocketbook_fetch::FetchError;
use thiserror::Error;

/// Error type for endpoint calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request failed or the response could not be used.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The input was rejected before anything was sent.
    #[error("Invalid input: {0}")]
    Invalid(#[from] CoreError),
}

impl ApiError {
    /// Creates an input error.
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(CoreError::InvalidData(message.into()))
    }

    /// The underlying fetch error, if any.
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            ApiError::Fetch(e) => Some(e),
            ApiError::Invalid(_) => None,
        }
    }

    /// Returns true when the session was cleared by a failed refresh.
    pub fn is_session_terminal(&self) -> bool {
        self.fetch_error().is_some_and(FetchError::is_session_terminal)
    }

    /// Returns true for a 429 response.
    pub fn is_rate_limited(&self) -> bool {
        self.fetch_error().is_some_and(FetchError::is_rate_limited)
    }

    /// Returns true when the transport timed out.
    pub fn is_timeout(&self) -> bool {
        self.fetch_error().is_some_and(FetchError::is_timeout)
    }

    /// Server-provided message, if any.
    pub fn server_message(&self) -> Option<&str> {
        self.fetch_error().and_then(FetchError::server_message)
    }

    /// Field-level validation messages from a 400 response.
    pub fn field_errors(&self) -> Vec<(String, String)> {
        self.fetch_error()
            .map(FetchError::field_errors)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_is_not_terminal() {
        let err = ApiError::invalid("amount must be positive");
        assert!(!err.is_session_terminal());
        assert!(err.fetch_error().is_none());
        assert_eq!(err.to_string(), "Invalid input: Invalid data: amount must be positive");
    }

    #[test]
    fn test_fetch_passthrough() {
        let err = ApiError::from(FetchError::authentication_failed("no token", None));
        assert!(err.is_session_terminal());
        assert_eq!(err.to_string(), "Authentication failed: no token");
    }
}
