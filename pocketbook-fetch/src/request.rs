//! Outgoing request descriptor.
//!
//! An [`ApiRequest`] is transport-agnostic and cheap to clone, which lets the
//! response interceptor hold on to it and replay it after a token refresh.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::error::FetchError;
use crate::form::MultipartForm;
use crate::refresh::REFRESH_PATH;

/// Whether a request has already been replayed after a 401.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplayState {
    /// Not yet replayed; eligible for one refresh-and-replay.
    #[default]
    Fresh,
    /// Already replayed once; a further 401 propagates as-is.
    Retried,
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// JSON document.
    Json(serde_json::Value),
    /// Multipart form, rebuilt for every send.
    Multipart(MultipartForm),
}

/// A request against the Pocketbook API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<RequestBody>,
    replay: ReplayState,
}

impl ApiRequest {
    /// Creates a request for `path` (relative to the API base URL).
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            replay: ReplayState::Fresh,
        }
    }

    /// GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// PATCH request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attaches a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, FetchError> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    /// Attaches a multipart form.
    #[must_use]
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    /// Appends query parameters.
    pub fn query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the API base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Payload, if any.
    pub fn payload(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// JSON body, if the payload is JSON.
    pub fn body(&self) -> Option<&serde_json::Value> {
        match &self.body {
            Some(RequestBody::Json(value)) => Some(value),
            _ => None,
        }
    }

    /// Multipart form, if the payload is a form.
    pub fn form(&self) -> Option<&MultipartForm> {
        match &self.body {
            Some(RequestBody::Multipart(form)) => Some(form),
            _ => None,
        }
    }

    /// Replay marker.
    pub fn replay_state(&self) -> ReplayState {
        self.replay
    }

    /// Returns true for the token refresh endpoint, which is never replayed.
    pub fn is_refresh_call(&self) -> bool {
        self.path.trim_end_matches('/') == REFRESH_PATH
    }

    // ========================================================================
    // Authorization
    // ========================================================================

    /// Sets `Authorization: Bearer <token>`.
    pub fn set_bearer(&mut self, token: &str) -> Result<(), FetchError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| FetchError::InvalidRequest(format!("invalid bearer token: {e}")))?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Bearer token currently attached, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }

    /// Marks the request as replayed.
    pub(crate) fn mark_retried(&mut self) {
        self.replay = ReplayState::Retried;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_roundtrip() {
        let mut request = ApiRequest::get("/api/user/data");
        assert!(request.bearer().is_none());

        request.set_bearer("abc.def").unwrap();
        assert_eq!(request.bearer(), Some("abc.def"));
        assert!(request.headers()[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn test_invalid_token_rejected() {
        let mut request = ApiRequest::get("/api/user/data");
        let err = request.set_bearer("bad\ntoken").unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
    }

    #[test]
    fn test_refresh_detection() {
        assert!(ApiRequest::get(REFRESH_PATH).is_refresh_call());
        assert!(ApiRequest::get("/api/user/refresh/").is_refresh_call());
        assert!(!ApiRequest::get("/api/user/data").is_refresh_call());
    }

    #[test]
    fn test_replay_marker() {
        let mut request = ApiRequest::post("/api/expense/expenses-per-month")
            .json(&serde_json::json!({"year": 2025}))
            .unwrap();
        assert_eq!(request.replay_state(), ReplayState::Fresh);

        request.mark_retried();
        let cloned = request.clone();
        assert_eq!(cloned.replay_state(), ReplayState::Retried);
        assert_eq!(cloned.body().unwrap()["year"], 2025);
    }

    #[test]
    fn test_query_pairs() {
        let request = ApiRequest::get("/api/user/filtered-tnx").query([("page", "1"), ("filter", "all")]);
        assert_eq!(request.query_pairs().len(), 2);
        assert_eq!(request.query_pairs()[1].1, "all");
    }

    #[test]
    fn test_multipart_payload_survives_replay() {
        use crate::form::FormFile;

        let form = MultipartForm::new()
            .text("type", "expense")
            .file("receipt", FormFile::new("r.png", vec![9]));
        let mut request = ApiRequest::post("/api/expense/upsert-transaction").multipart(form.clone());
        request.mark_retried();

        let replay = request.clone();
        assert_eq!(replay.form(), Some(&form));
        assert!(replay.body().is_none());
        assert!(matches!(replay.payload(), Some(RequestBody::Multipart(_))));
    }
}
