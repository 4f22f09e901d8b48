//! Fetch error types.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

// ============================================================================
// Error Body
// ============================================================================

/// JSON error body returned by the API.
///
/// Every field is optional; bodies that are not JSON at all still produce an
/// `ErrorBody` with only [`ErrorBody::raw`] set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Human-readable error.
    #[serde(default)]
    pub error: Option<String>,
    /// Rate-limit hint such as `"60s"`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub retry_after: Option<String>,
    /// Field-level validation messages (`{field: [messages]}`).
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    /// Raw body text.
    #[serde(skip)]
    pub raw: String,
}

impl ErrorBody {
    /// Parses a response body, never failing.
    pub fn parse(body: &[u8]) -> Self {
        let mut parsed: Self = serde_json::from_slice(body).unwrap_or_default();
        parsed.raw = String::from_utf8_lossy(body).into_owned();
        parsed
    }

    /// Best available message: the `error` field, else the raw text.
    pub fn message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or_else(|| Some(self.raw.trim()).filter(|raw| !raw.is_empty()))
    }

    /// First message for each field in `details`.
    pub fn field_errors(&self) -> Vec<(String, String)> {
        let Some(serde_json::Value::Object(details)) = &self.details else {
            return Vec::new();
        };

        details
            .iter()
            .filter_map(|(field, messages)| {
                let first = match messages {
                    serde_json::Value::Array(items) => items.first()?.as_str()?,
                    serde_json::Value::String(message) => message.as_str(),
                    _ => return None,
                };
                Some((field.clone(), first.to_string()))
            })
            .collect()
    }
}

/// Accepts `"60s"` as well as a bare number for `retryAfter`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// ============================================================================
// Fetch Error
// ============================================================================

/// Error type for API requests.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {}", .body.message().unwrap_or("request failed"))]
    Status {
        /// Response status.
        status: StatusCode,
        /// Parsed error body.
        body: ErrorBody,
    },

    /// The session could not be renewed and has been cleared.
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed {
        /// What went wrong.
        reason: String,
        /// Failure of the refresh call, when there was one.
        #[source]
        source: Option<Arc<FetchError>>,
    },

    /// A required field was missing from a success response.
    #[error("Malformed response from {endpoint}: missing `{field}`")]
    MalformedResponse {
        /// Endpoint path.
        endpoint: String,
        /// Missing field.
        field: &'static str,
    },

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-reqwest transport failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl FetchError {
    /// Creates the session-terminal error.
    pub fn authentication_failed(reason: impl Into<String>, source: Option<Arc<FetchError>>) -> Self {
        FetchError::AuthenticationFailed {
            reason: reason.into(),
            source,
        }
    }

    /// HTTP status, if the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Returns true when the session was cleared because refresh failed.
    pub fn is_session_terminal(&self) -> bool {
        matches!(self, FetchError::AuthenticationFailed { .. })
    }

    /// Returns true for a 429 response.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(StatusCode::TOO_MANY_REQUESTS)
    }

    /// Returns true if the transport gave up waiting.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Http(e) if e.is_timeout())
    }

    /// Error body, for status errors.
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            FetchError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Server-provided message, if any.
    ///
    /// For a failed session renewal this is the refresh call's message.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            FetchError::AuthenticationFailed {
                source: Some(source),
                ..
            } => source.server_message(),
            _ => self.body().and_then(ErrorBody::message),
        }
    }

    /// First validation message per field, for 400 responses.
    pub fn field_errors(&self) -> Vec<(String, String)> {
        self.body().map(ErrorBody::field_errors).unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
