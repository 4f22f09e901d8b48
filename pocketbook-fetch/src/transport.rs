//! Transport seam between the interceptor and the network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::cookie::{CookieStore, Jar};
use tracing::{debug, instrument};
use url::Url;

use crate::error::FetchError;
use crate::request::{ApiRequest, RequestBody};
use crate::response::ApiResponse;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for Pocketbook.
const USER_AGENT: &str = concat!("Pocketbook/", env!("CARGO_PKG_VERSION"));

/// Sends a prepared request and buffers the response.
///
/// Non-success statuses are returned as `Ok`; classifying them is the
/// interceptor's job.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, FetchError>;
}

// ============================================================================
// HTTP Transport
// ============================================================================

/// reqwest-backed transport with a persistent cookie jar.
///
/// The jar carries the server's refresh cookie, which is what the token
/// refresh endpoint authenticates with.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: Client,
    base_url: Url,
    cookies: Arc<Jar>,
}

impl HttpTransport {
    /// Creates a transport with the default timeout.
    pub fn new(base_url: Url) -> Result<Self, FetchError> {
        Self::builder(base_url).build()
    }

    /// Starts a builder.
    pub fn builder(base_url: Url) -> HttpTransportBuilder {
        HttpTransportBuilder {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent_suffix: None,
        }
    }

    /// API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Cookie header the jar would send to the API, if any.
    pub fn session_cookie(&self) -> Option<String> {
        self.cookies
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Seeds the jar from a saved `Cookie` header (`a=1; b=2`).
    pub fn restore_session_cookie(&self, header: &str) {
        for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.cookies.add_cookie_str(pair, &self.base_url);
        }
    }

    /// Joins `path` and `query` onto the base URL.
    ///
    /// Plain concatenation keeps any path prefix of the base URL intact.
    fn url_for(&self, request: &ApiRequest) -> Result<Url, FetchError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = request.path();
        let joined = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };

        let mut url = Url::parse(&joined)
            .map_err(|e| FetchError::InvalidRequest(format!("bad URL {joined}: {e}")))?;
        if !request.query_pairs().is_empty() {
            url.query_pairs_mut().extend_pairs(request.query_pairs());
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method(), path = request.path()))]
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, FetchError> {
        let url = self.url_for(request)?;

        let mut builder = self
            .inner
            .request(request.method().clone(), url)
            .headers(request.headers().clone());
        builder = match request.payload() {
            Some(RequestBody::Json(body)) => builder.json(body),
            Some(RequestBody::Multipart(form)) => builder.multipart(form.to_form()?),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        debug!(status = %status, bytes = body.len(), "Response received");

        Ok(ApiResponse::new(status, body.to_vec()).with_headers(headers))
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportBuilder {
    base_url: Url,
    timeout: Duration,
    user_agent_suffix: Option<String>,
}

impl HttpTransportBuilder {
    /// Sets the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Appends text to the user agent.
    #[must_use]
    pub fn user_agent_suffix(mut self, suffix: Option<String>) -> Self {
        self.user_agent_suffix = suffix.filter(|s| !s.trim().is_empty());
        self
    }

    /// Builds the transport.
    pub fn build(self) -> Result<HttpTransport, FetchError> {
        let user_agent = match &self.user_agent_suffix {
            Some(suffix) => format!("{USER_AGENT} {}", suffix.trim()),
            None => USER_AGENT.to_string(),
        };
        let cookies = Arc::new(Jar::default());

        let inner = Client::builder()
            .timeout(self.timeout)
            .user_agent(user_agent)
            .cookie_provider(Arc::clone(&cookies))
            .build()?;

        Ok(HttpTransport {
            inner,
            base_url: self.base_url,
            cookies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn test_url_join_keeps_prefix() {
        let t = transport("https://api.example.com/v1/");
        let url = t.url_for(&ApiRequest::get("/api/user/data")).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/api/user/data");
    }

    #[test]
    fn test_url_query_encoding() {
        let t = transport("http://localhost:3000");
        let request = ApiRequest::get("/api/user/filtered-tnx")
            .query([("page", "2"), ("search", "coffee & tea")]);
        let url = t.url_for(&request).unwrap();
        assert_eq!(url.query(), Some("page=2&search=coffee+%26+tea"));
    }

    #[test]
    fn test_no_trailing_question_mark() {
        let t = transport("http://localhost:3000");
        let url = t.url_for(&ApiRequest::get("api/user/data")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/user/data");
    }

    #[test]
    fn test_cookie_restore() {
        let t = transport("http://localhost:3000");
        assert!(t.session_cookie().is_none());

        t.restore_session_cookie("refreshToken=abc; theme=dark");
        let header = t.session_cookie().unwrap();
        assert!(header.contains("refreshToken=abc"));
        assert!(header.contains("theme=dark"));
    }
}
