//! Buffered API response.

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::{ErrorBody, FetchError};

/// A fully-read response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    /// Creates a response.
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Creates a response with a JSON body.
    pub fn json_body(status: StatusCode, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    /// Attaches headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns true for 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the whole body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Projects one required top-level field out of a JSON body.
    ///
    /// A missing or `null` field is reported as
    /// [`FetchError::MalformedResponse`] naming `endpoint` and `field`.
    pub fn field<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        field: &'static str,
    ) -> Result<T, FetchError> {
        let malformed = || FetchError::MalformedResponse {
            endpoint: endpoint.to_string(),
            field,
        };

        let mut value: serde_json::Value =
            serde_json::from_slice(&self.body).map_err(|_| malformed())?;
        match value.get_mut(field).map(serde_json::Value::take) {
            None | Some(serde_json::Value::Null) => Err(malformed()),
            Some(raw) => Ok(serde_json::from_value(raw)?),
        }
    }

    /// Parsed error body.
    pub fn error_body(&self) -> ErrorBody {
        ErrorBody::parse(&self.body)
    }

    /// Converts a non-success response into the matching error.
    pub fn into_error(self) -> FetchError {
        FetchError::Status {
            status: self.status,
            body: ErrorBody::parse(&self.body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_projection() {
        let response = ApiResponse::json_body(StatusCode::OK, &json!({"user": {"name": "A"}}));
        let user: serde_json::Value = response.field("/api/user/data", "user").unwrap();
        assert_eq!(user["name"], "A");
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let response = ApiResponse::json_body(StatusCode::OK, &json!({"user": null}));
        let err = response
            .field::<serde_json::Value>("/api/user/data", "user")
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::MalformedResponse { field: "user", .. }
        ));

        let not_json = ApiResponse::new(StatusCode::OK, "<html>");
        assert!(matches!(
            not_json.field::<serde_json::Value>("/x", "user"),
            Err(FetchError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_wrong_field_type_is_json_error() {
        let response = ApiResponse::json_body(StatusCode::OK, &json!({"expenses": "nope"}));
        let err = response.field::<Vec<u32>>("/x", "expenses").unwrap_err();
        assert!(matches!(err, FetchError::Json(_)));
    }

    #[test]
    fn test_into_error() {
        let response = ApiResponse::json_body(StatusCode::CONFLICT, &json!({"error": "exists"}));
        let err = response.into_error();
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert_eq!(err.server_message(), Some("exists"));
    }
}
