//! Session-aware API client.
//!
//! [`ApiClient`] wraps a [`Transport`] with the request and response
//! interceptors. Outgoing requests get the bearer token and flip the
//! loading flag. Responses are classified:
//!
//! - 2xx: loading off, authorized on.
//! - 401: one shared token refresh, then a single replay.
//! - 429: the retry-after hint is recorded and the store is marked
//!   rate-limited.
//! - anything else: loading off, error passed through.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use pocketbook_store::SessionStore;

use crate::error::{ErrorBody, FetchError};
use crate::form::MultipartForm;
use crate::rate_limit::parse_retry_after;
use crate::refresh::{RefreshCoordinator, RefreshOutcome};
use crate::request::{ApiRequest, ReplayState};
use crate::response::ApiResponse;
use crate::transport::Transport;

/// What the response interceptor decided.
enum Interception {
    Settled(ApiResponse),
    Replay,
}

/// HTTP client bound to a session store.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: SessionStore,
    refresh: RefreshCoordinator,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("refresh", &self.refresh)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client.
    pub fn new(transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        Self {
            transport,
            session,
            refresh: RefreshCoordinator::new(),
        }
    }

    /// The session store this client reads and writes.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// The refresh coordinator.
    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    // ========================================================================
    // Request pipeline
    // ========================================================================

    /// Sends `request` through both interceptors.
    ///
    /// A request is sent at most twice: once, and once more after a
    /// successful token refresh.
    #[instrument(skip(self, request), fields(method = %request.method(), path = request.path()))]
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse, FetchError> {
        loop {
            self.prepare(&mut request)?;
            debug!(replay = ?request.replay_state(), "Sending request");

            let outcome = self.transport.send(&request).await;
            match self.intercept_response(&mut request, outcome).await? {
                Interception::Settled(response) => return Ok(response),
                Interception::Replay => {}
            }
        }
    }

    /// Request interceptor: loading on, bearer attached when a token exists.
    fn prepare(&self, request: &mut ApiRequest) -> Result<(), FetchError> {
        self.session.set_loading(true);

        if let Some(token) = self.session.token() {
            if let Err(e) = request.set_bearer(&token) {
                self.session.set_loading(false);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Response interceptor.
    async fn intercept_response(
        &self,
        request: &mut ApiRequest,
        outcome: Result<ApiResponse, FetchError>,
    ) -> Result<Interception, FetchError> {
        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                self.session.set_loading(false);
                debug!(error = %e, "Transport failure");
                return Err(e);
            }
        };

        let status = response.status();
        debug!(status = %status, "Response");

        if response.is_success() {
            self.session.set_loading(false);
            self.session.set_authorized(true);
            return Ok(Interception::Settled(response));
        }

        match status {
            StatusCode::UNAUTHORIZED
                if !request.is_refresh_call() && request.replay_state() == ReplayState::Fresh =>
            {
                self.recover_session(request).await
            }
            StatusCode::TOO_MANY_REQUESTS => {
                self.session.set_loading(false);
                self.record_rate_limit(&response.error_body());
                Err(response.into_error())
            }
            _ => {
                self.session.set_loading(false);
                Err(response.into_error())
            }
        }
    }

    /// Stores the retry-after hint and raises the rate-limit flag.
    fn record_rate_limit(&self, body: &ErrorBody) {
        let retry_after = parse_retry_after(body.retry_after.as_deref());
        self.session.set_retry_after(retry_after);
        self.session.set_rate_limited(true);
        warn!(retry_after_secs = retry_after, "Rate limited");
    }

    /// Refreshes the token after a 401 and arranges the replay.
    async fn recover_session(&self, request: &mut ApiRequest) -> Result<Interception, FetchError> {
        request.mark_retried();

        match self.refresh.refresh(Arc::clone(&self.transport)).await {
            Ok(Some(token)) => {
                info!("Access token refreshed, replaying request");
                self.session.set_token(token.clone());
                if let Err(e) = request.set_bearer(&token) {
                    self.session.set_loading(false);
                    return Err(e);
                }
                Ok(Interception::Replay)
            }
            Ok(None) => {
                warn!("Token refresh returned no access token");
                Err(self.terminate_session("refresh returned no access token", None))
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                Err(self.terminate_session("token refresh failed", Some(e)))
            }
        }
    }

    /// Ends the session after an unrecoverable 401.
    fn terminate_session(&self, reason: &str, source: Option<Arc<FetchError>>) -> FetchError {
        self.session.set_loading(false);
        self.session.clear_session();
        self.session.set_authorized(false);
        FetchError::authentication_failed(reason, source)
    }

    /// Requests a new access token and stores it.
    ///
    /// Shares the in-flight refresh with the response interceptor, so an
    /// explicit refresh during a 401 recovery costs no extra call. The
    /// refresh response is classified like any other: success marks the
    /// session authorized, and a 429 records the retry-after hint and comes
    /// back as the original status error. Other failures do not touch the
    /// session; callers decide what to clear.
    pub async fn refresh_access_token(&self) -> Result<String, FetchError> {
        self.session.set_loading(true);
        let outcome: RefreshOutcome = self.refresh.refresh(Arc::clone(&self.transport)).await;
        self.session.set_loading(false);

        match outcome {
            Ok(Some(token)) => {
                info!("Access token refreshed");
                self.session.set_token(token.clone());
                self.session.set_authorized(true);
                Ok(token)
            }
            Ok(None) => {
                self.session.set_authorized(true);
                Err(FetchError::authentication_failed(
                    "refresh returned no access token",
                    None,
                ))
            }
            Err(e) => match e.as_ref() {
                FetchError::Status { status, body } if *status == StatusCode::TOO_MANY_REQUESTS => {
                    self.record_rate_limit(body);
                    Err(FetchError::Status {
                        status: *status,
                        body: body.clone(),
                    })
                }
                _ => Err(FetchError::authentication_failed("token refresh failed", Some(e))),
            },
        }
    }

    // ========================================================================
    // Convenience
    // ========================================================================

    /// GET `path`.
    pub async fn get(&self, path: &str) -> Result<ApiResponse, FetchError> {
        self.execute(ApiRequest::get(path)).await
    }

    /// POST `body` as JSON to `path`.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<ApiResponse, FetchError> {
        self.execute(ApiRequest::post(path).json(body)?).await
    }

    /// PATCH `body` as JSON to `path`.
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<ApiResponse, FetchError> {
        self.execute(ApiRequest::patch(path).json(body)?).await
    }

    /// POST a multipart `form` to `path`.
    pub async fn post_form(&self, path: &str, form: MultipartForm) -> Result<ApiResponse, FetchError> {
        self.execute(ApiRequest::post(path).multipart(form)).await
    }

    /// DELETE `path`.
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, FetchError> {
        self.execute(ApiRequest::delete(path)).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresh::REFRESH_PATH;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Clone)]
    enum RefreshScript {
        Token(&'static str),
        NoToken,
        Fail(StatusCode),
        Limited(&'static str),
    }

    /// Accepts one bearer token; everything else gets 401.
    struct ScriptedTransport {
        valid_token: &'static str,
        refresh: RefreshScript,
        calls: Mutex<HashMap<String, usize>>,
        canned: Mutex<HashMap<String, VecDeque<ApiResponse>>>,
        observer: Option<SessionStore>,
        loading_seen: Mutex<Vec<bool>>,
    }

    impl ScriptedTransport {
        fn new(valid_token: &'static str, refresh: RefreshScript) -> Self {
            Self {
                valid_token,
                refresh,
                calls: Mutex::new(HashMap::new()),
                canned: Mutex::new(HashMap::new()),
                observer: None,
                loading_seen: Mutex::new(Vec::new()),
            }
        }

        fn with_response(self, path: &str, response: ApiResponse) -> Self {
            self.canned
                .lock()
                .unwrap()
                .entry(path.to_string())
                .or_default()
                .push_back(response);
            self
        }

        fn observing(mut self, session: SessionStore) -> Self {
            self.observer = Some(session);
            self
        }

        fn calls(&self, path: &str) -> usize {
            self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, FetchError> {
            *self
                .calls
                .lock()
                .unwrap()
                .entry(request.path().to_string())
                .or_default() += 1;
            if let Some(session) = &self.observer {
                self.loading_seen.lock().unwrap().push(session.is_loading());
            }

            if request.path() == "/down" {
                return Err(FetchError::Transport("connection refused".into()));
            }

            if request.path() == REFRESH_PATH {
                assert!(request.bearer().is_none(), "refresh must not carry a bearer");
                tokio::time::sleep(Duration::from_millis(50)).await;
                return Ok(match &self.refresh {
                    RefreshScript::Token(token) => {
                        ApiResponse::json_body(StatusCode::OK, &json!({"accessToken": token}))
                    }
                    RefreshScript::NoToken => ApiResponse::json_body(StatusCode::OK, &json!({})),
                    RefreshScript::Fail(status) => {
                        ApiResponse::json_body(*status, &json!({"error": "Refresh token expired"}))
                    }
                    RefreshScript::Limited(hint) => ApiResponse::json_body(
                        StatusCode::TOO_MANY_REQUESTS,
                        &json!({"error": "Too many requests", "retryAfter": hint}),
                    ),
                });
            }

            let canned = self
                .canned
                .lock()
                .unwrap()
                .get_mut(request.path())
                .and_then(VecDeque::pop_front);
            if let Some(response) = canned {
                return Ok(response);
            }

            if request.bearer() == Some(self.valid_token) {
                Ok(ApiResponse::json_body(
                    StatusCode::OK,
                    &json!({"path": request.path()}),
                ))
            } else {
                Ok(ApiResponse::json_body(
                    StatusCode::UNAUTHORIZED,
                    &json!({"error": "Unauthorized"}),
                ))
            }
        }
    }

    fn client_with(transport: &Arc<ScriptedTransport>, token: &str) -> ApiClient {
        let session = SessionStore::new();
        session.set_token(token);
        ApiClient::new(transport.clone(), session)
    }

    #[tokio::test]
    async fn test_success_with_valid_token() {
        let transport = Arc::new(ScriptedTransport::new("good", RefreshScript::NoToken));
        let client = client_with(&transport, "good");
        client.session().set_authorized(false);

        let response = client.get("/api/user/data").await.unwrap();
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["path"], "/api/user/data");
        assert!(!client.session().is_loading());
        assert!(client.session().is_authorized());
        assert_eq!(transport.calls(REFRESH_PATH), 0);
    }

    #[tokio::test]
    async fn test_loading_set_while_in_flight() {
        let session = SessionStore::new();
        session.set_token("good");
        let transport = Arc::new(
            ScriptedTransport::new("good", RefreshScript::NoToken).observing(session.clone()),
        );
        let client = ApiClient::new(transport.clone(), session);

        client.get("/api/user/data").await.unwrap();
        assert_eq!(*transport.loading_seen.lock().unwrap(), vec![true]);
        assert!(!client.session().is_loading());
    }

    #[tokio::test]
    async fn test_no_token_sends_no_header() {
        let transport = Arc::new(ScriptedTransport::new("good", RefreshScript::Fail(StatusCode::UNAUTHORIZED)));
        let client = ApiClient::new(transport.clone(), SessionStore::new());

        let err = client.get("/api/user/data").await.unwrap_err();
        assert!(err.is_session_terminal());
        assert_eq!(transport.calls("/api/user/data"), 1);
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let transport = Arc::new(ScriptedTransport::new("fresh", RefreshScript::Token("fresh")));
        let client = client_with(&transport, "stale");

        let paths = ["/a", "/b", "/c", "/d", "/e"];
        let results =
            futures::future::join_all(paths.iter().map(|path| client.get(path))).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(transport.calls(REFRESH_PATH), 1);
        assert_eq!(client.refresh_coordinator().refreshes_started(), 1);
        for path in paths {
            assert_eq!(transport.calls(path), 2, "{path} sent once and replayed once");
        }
        assert_eq!(client.session().token().as_deref(), Some("fresh"));
        assert!(client.session().is_authorized());
        assert!(!client.session().is_loading());
    }

    #[tokio::test]
    async fn test_concurrent_401s_fail_together() {
        let transport = Arc::new(ScriptedTransport::new(
            "fresh",
            RefreshScript::Fail(StatusCode::UNAUTHORIZED),
        ));
        let client = client_with(&transport, "stale");
        client.session().set_user(pocketbook_core::UserProfile::default());

        let (a, b, c) = tokio::join!(client.get("/a"), client.get("/b"), client.get("/c"));

        for result in [a, b, c] {
            let err = result.unwrap_err();
            assert!(err.is_session_terminal());
            assert_eq!(err.server_message(), Some("Refresh token expired"));
        }
        assert_eq!(transport.calls(REFRESH_PATH), 1);
        assert_eq!(transport.calls("/a"), 1);
        let state = client.session().snapshot();
        assert!(state.bearer_token.is_empty());
        assert!(!state.is_authorized);
        assert!(!state.is_loading);
        assert!(state.user.is_none());
    }

    #[tokio::test]
    async fn test_refresh_without_token_ends_session() {
        let transport = Arc::new(ScriptedTransport::new("fresh", RefreshScript::NoToken));
        let client = client_with(&transport, "stale");

        let err = client.get("/api/user/data").await.unwrap_err();
        assert!(err.is_session_terminal());
        assert!(client.session().token().is_none());
        assert!(!client.session().is_authorized());
    }

    #[tokio::test]
    async fn test_replayed_request_is_not_retried_again() {
        // The refreshed token is still rejected.
        let transport = Arc::new(ScriptedTransport::new("fresh", RefreshScript::Token("other")));
        let client = client_with(&transport, "stale");

        let err = client.get("/api/user/data").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(!err.is_session_terminal());
        assert_eq!(transport.calls("/api/user/data"), 2);
        assert_eq!(transport.calls(REFRESH_PATH), 1);
        assert!(!client.session().is_loading());
    }

    #[tokio::test]
    async fn test_refresh_endpoint_401_not_intercepted() {
        let transport = Arc::new(ScriptedTransport::new(
            "fresh",
            RefreshScript::Fail(StatusCode::UNAUTHORIZED),
        ));
        let client = ApiClient::new(transport.clone(), SessionStore::new());

        let err = client.execute(ApiRequest::get(REFRESH_PATH)).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(!err.is_session_terminal());
        assert_eq!(transport.calls(REFRESH_PATH), 1);
        assert_eq!(client.refresh_coordinator().refreshes_started(), 0);
        assert!(client.session().is_authorized());
    }

    #[tokio::test]
    async fn test_rate_limit_records_retry_after() {
        let transport = Arc::new(
            ScriptedTransport::new("good", RefreshScript::NoToken).with_response(
                "/api/expense/top-five-expenses",
                ApiResponse::json_body(
                    StatusCode::TOO_MANY_REQUESTS,
                    &json!({"error": "Too many requests", "retryAfter": "45s"}),
                ),
            ),
        );
        let client = client_with(&transport, "good");

        let err = client.get("/api/expense/top-five-expenses").await.unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(err.server_message(), Some("Too many requests"));
        assert!(client.session().is_rate_limited());
        assert_eq!(client.session().retry_after_secs(), 45);
        assert!(!client.session().is_loading());
    }

    #[tokio::test]
    async fn test_rate_limit_defaults_to_sixty() {
        let transport = Arc::new(
            ScriptedTransport::new("good", RefreshScript::NoToken)
                .with_response(
                    "/x",
                    ApiResponse::json_body(StatusCode::TOO_MANY_REQUESTS, &json!({"retryAfter": "soon"})),
                )
                .with_response("/x", ApiResponse::new(StatusCode::TOO_MANY_REQUESTS, "")),
        );
        let client = client_with(&transport, "good");

        client.session().set_retry_after(5);
        let _ = client.get("/x").await.unwrap_err();
        assert_eq!(client.session().retry_after_secs(), 60);

        client.session().set_retry_after(5);
        let _ = client.get("/x").await.unwrap_err();
        assert_eq!(client.session().retry_after_secs(), 60);
    }

    #[tokio::test]
    async fn test_other_errors_pass_through() {
        let transport = Arc::new(
            ScriptedTransport::new("good", RefreshScript::NoToken).with_response(
                "/api/user/data",
                ApiResponse::json_body(StatusCode::INTERNAL_SERVER_ERROR, &json!({"error": "boom"})),
            ),
        );
        let client = client_with(&transport, "good");

        let err = client.get("/api/user/data").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!client.session().is_loading());
        assert!(!client.session().is_rate_limited());
        assert_eq!(client.session().token().as_deref(), Some("good"));
    }

    #[tokio::test]
    async fn test_transport_error_clears_loading() {
        let transport = Arc::new(ScriptedTransport::new("good", RefreshScript::NoToken));
        let client = client_with(&transport, "good");

        let err = client.get("/down").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        assert!(!client.session().is_loading());
    }

    #[tokio::test]
    async fn test_invalid_token_aborts_before_sending() {
        let transport = Arc::new(ScriptedTransport::new("good", RefreshScript::NoToken));
        let client = client_with(&transport, "bad\ntoken");

        let err = client.get("/api/user/data").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
        assert_eq!(transport.calls("/api/user/data"), 0);
        assert!(!client.session().is_loading());
    }

    #[tokio::test]
    async fn test_explicit_refresh_joins_interceptor_refresh() {
        let transport = Arc::new(ScriptedTransport::new("fresh", RefreshScript::Token("fresh")));
        let client = client_with(&transport, "stale");

        let (data, token) = tokio::join!(client.get("/api/user/data"), async {
            // Let the request hit its 401 first.
            tokio::time::sleep(Duration::from_millis(10)).await;
            client.refresh_access_token().await
        });

        assert!(data.is_ok());
        assert_eq!(token.unwrap(), "fresh");
        assert_eq!(transport.calls(REFRESH_PATH), 1);
    }

    #[tokio::test]
    async fn test_explicit_refresh_failure_leaves_session() {
        let transport = Arc::new(ScriptedTransport::new(
            "fresh",
            RefreshScript::Fail(StatusCode::FORBIDDEN),
        ));
        let client = client_with(&transport, "stale");

        let err = client.refresh_access_token().await.unwrap_err();
        assert!(err.is_session_terminal());
        assert_eq!(client.session().token().as_deref(), Some("stale"));
        assert!(!client.session().is_loading());
    }

    #[tokio::test]
    async fn test_explicit_refresh_marks_authorized() {
        let transport = Arc::new(ScriptedTransport::new("fresh", RefreshScript::Token("fresh")));
        let client = ApiClient::new(transport.clone(), SessionStore::new());
        client.session().set_authorized(false);

        assert_eq!(client.refresh_access_token().await.unwrap(), "fresh");
        assert!(client.session().is_authorized());
        assert!(!client.session().is_loading());
    }

    #[tokio::test]
    async fn test_explicit_refresh_rate_limited() {
        let transport = Arc::new(ScriptedTransport::new("fresh", RefreshScript::Limited("45s")));
        let client = client_with(&transport, "stale");

        let err = client.refresh_access_token().await.unwrap_err();
        assert!(err.is_rate_limited());
        assert!(!err.is_session_terminal());
        assert_eq!(err.server_message(), Some("Too many requests"));
        assert!(client.session().is_rate_limited());
        assert_eq!(client.session().retry_after_secs(), 45);
        assert_eq!(client.session().token().as_deref(), Some("stale"));
        assert!(!client.session().is_loading());
    }

    #[tokio::test]
    async fn test_rate_limited_refresh_during_recovery_ends_session() {
        let transport = Arc::new(ScriptedTransport::new("fresh", RefreshScript::Limited("45s")));
        let client = client_with(&transport, "stale");

        let err = client.get("/api/user/data").await.unwrap_err();
        assert!(err.is_session_terminal());
        assert!(!client.session().is_rate_limited());
        assert!(!client.session().is_authorized());
    }
}
