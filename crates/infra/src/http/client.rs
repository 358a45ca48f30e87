use std::time::Duration;

use classeviva_domain::{ApiError, ApiResult};
use reqwest::redirect::Policy;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;
use url::Url;

/// HTTP client bound to one backend host.
///
/// Requests are addressed by paths relative to the host. There is no retry:
/// every call dispatches exactly one request.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    base_url: Url,
}

impl HttpClient {
    /// Start building a new HTTP client for `base_url`.
    pub fn builder(base_url: impl Into<String>) -> HttpClientBuilder {
        HttpClientBuilder::new(base_url)
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` against the host. Absolute URLs are used unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` when the result is not a valid URL.
    pub fn url(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::config(format!("Invalid request path {path}: {err}")))
    }

    /// Create a request builder for a host-relative path.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` when the path does not form a valid URL.
    pub fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        Ok(self.client.request(method, self.url(path)?))
    }

    /// Execute the provided request builder once.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` when no response was received.
    pub async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let request = builder
            .build()
            .map_err(|err| ApiError::config(format!("Failed to build request: {err}")))?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, path = url.path(), "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                debug!(%method, path = url.path(), %status, "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, path = url.path(), error = %err, "HTTP request failed");
                Err(map_transport_error(&err))
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    base_url: String,
    timeout: Duration,
}

impl HttpClientBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), timeout: Duration::from_secs(30) }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// # Errors
    ///
    /// Returns `ApiError::Config` for an invalid base URL or TLS setup failure.
    pub fn build(self) -> ApiResult<HttpClient> {
        let base_url = normalize_base_url(&self.base_url)?;

        // Redirects stay visible so `Location` can be read.
        let builder = ReqwestClient::builder().timeout(self.timeout).redirect(Policy::none());

        let client = builder
            .build()
            .map_err(|err| ApiError::config(format!("Failed to build HTTP client: {err}")))?;

        Ok(HttpClient { client, base_url })
    }
}

fn normalize_base_url(raw: &str) -> ApiResult<Url> {
    let with_slash = if raw.ends_with('/') { raw.to_string() } else { format!("{raw}/") };
    Url::parse(&with_slash).map_err(|err| ApiError::config(format!("Invalid host {raw}: {err}")))
}

fn map_transport_error(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::network(format!("HTTP request timed out: {err}"))
    } else if err.is_connect() {
        ApiError::network(format!("HTTP connection failed: {err}"))
    } else {
        ApiError::network(format!("HTTP request failed: {err}"))
    }
}
