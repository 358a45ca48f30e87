//! Authentication strategies
//!
//! A [`SessionStrategy`] is everything that differs between the three
//! backends: the handshake, how the credential rides on each request and how
//! a successful response can still carry a failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use classeviva_common::CachedSnapshot;
use classeviva_domain::{ApiError, ApiResult, ClientOptions, UserProfile};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde_json::Value;

use super::base::SessionClient;

/// Result of a successful handshake or cache restore
#[derive(Debug, Clone)]
pub struct Handshake {
    pub token: String,
    pub expiration: Option<DateTime<Utc>>,
    pub user: UserProfile,
    /// Login response to persist, when the backend supports it
    pub snapshot: Option<CachedSnapshot>,
}

/// Backend specific half of a [`SessionClient`]
#[async_trait]
pub trait SessionStrategy: Send + Sync + Sized + 'static {
    /// Component name used in logs.
    const NAME: &'static str;

    /// Callable surface of the client, reported by `get_methods`.
    const METHODS: &'static [&'static str];

    /// Whether login responses are persisted and restored.
    const USES_CACHE: bool = false;

    /// Whether keep-alive renewal applies.
    const RENEWS: bool = false;

    /// Adjust the default headers sent with every request.
    fn customize_headers(options: &ClientOptions, headers: &mut HeaderMap);

    /// Check the credentials before any I/O.
    ///
    /// # Errors
    ///
    /// Returns a precondition error for unusable credentials.
    fn validate(options: &ClientOptions) -> ApiResult<()> {
        if options.has_credentials() {
            Ok(())
        } else {
            Err(ApiError::precondition("Username or password not set"))
        }
    }

    /// Perform the network login.
    ///
    /// Errors are expected to have gone through the client's error funnel.
    async fn handshake(client: &SessionClient<Self>) -> ApiResult<Handshake>;

    /// Header carrying `token` on authenticated requests.
    fn attach(token: &str) -> Option<(HeaderName, HeaderValue)>;

    /// Failure embedded in a response body, if any.
    fn business_error(status: StatusCode, body: &Value) -> Option<ApiError>;

    /// Rebuild a session from a persisted login response.
    fn restore(_snapshot: &CachedSnapshot) -> Option<Handshake> {
        None
    }
}
