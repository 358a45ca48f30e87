//! Session client shared by the three backends
//!
//! [`SessionClient`] owns the transport, default headers, session state and
//! the keep-alive timer. The strategy type parameter supplies the handshake
//! and the response conventions of one backend.
//!
//! Lifecycle: `login` adopts a valid cached snapshot or performs the
//! handshake, establishes the session and arms renewal. `logout` cancels the
//! timer and clears the session. A renewal re-runs the handshake on its own,
//! bypassing the cache and the "already logged in" check.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use classeviva_common::session::{renewal_delay, RenewalTimer};
use classeviva_common::{DebugLog, FileSessionCache, SessionCache};
use classeviva_domain::constants::{REQUESTED_WITH, REQUESTED_WITH_HEADER};
use classeviva_domain::{
    ApiError, ApiResult, App, AppIdentity, Authorization, ClientOptions, Logging, Session, State,
    UserProfile,
};
use parking_lot::{Mutex, RwLock};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::cookies::last_cookie;
use super::fetch::{FetchRequest, RawResponse, RequestBody};
use super::strategy::{Handshake, SessionStrategy};
use crate::http::HttpClient;

/// Failed renewals are retried only while the token has this much life left.
const RENEWAL_RETRY_FLOOR_SECS: i64 = 60;

const BASE_METHODS: &[&str] = &["login", "logout", "get_methods"];

/// Authenticated client for one backend
///
/// Cloning is cheap; clones share the same session.
pub struct SessionClient<S: SessionStrategy> {
    inner: Arc<ClientInner<S>>,
}

impl<S: SessionStrategy> Clone for SessionClient<S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<S: SessionStrategy> std::fmt::Debug for SessionClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("strategy", &S::NAME)
            .field("host", &self.host())
            .field("authorized", &self.authorized())
            .finish_non_exhaustive()
    }
}

struct ClientInner<S> {
    options: ClientOptions,
    region: RwLock<State>,
    http: RwLock<HttpClient>,
    headers: RwLock<HeaderMap>,
    session: RwLock<Session>,
    cache: Option<Arc<dyn SessionCache>>,
    renewal: Mutex<Option<RenewalTimer>>,
    /// Bumped on logout; renewals started under an older epoch are discarded.
    epoch: AtomicU64,
    log: DebugLog,
    _strategy: PhantomData<fn() -> S>,
}

impl<S: SessionStrategy> SessionClient<S> {
    /// Create a client, persisting sessions to `options.cache_path` when the
    /// backend supports it and `save_temp_file` is on.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` when the host cannot be used.
    pub fn new(options: ClientOptions) -> ApiResult<Self> {
        let cache = (S::USES_CACHE && options.save_temp_file).then(|| {
            Arc::new(FileSessionCache::new(options.cache_path.clone())) as Arc<dyn SessionCache>
        });
        Self::build(options, cache)
    }

    /// Create a client with a caller supplied session cache.
    ///
    /// The cache is ignored unless `save_temp_file` is on.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` when the host cannot be used.
    pub fn with_cache(options: ClientOptions, cache: Arc<dyn SessionCache>) -> ApiResult<Self> {
        let cache = (S::USES_CACHE && options.save_temp_file).then_some(cache);
        Self::build(options, cache)
    }

    fn build(options: ClientOptions, cache: Option<Arc<dyn SessionCache>>) -> ApiResult<Self> {
        let log = DebugLog::new(S::NAME, options.debug, options.log_sink.clone());
        let region = options.state;
        let host = options.host.clone().unwrap_or_else(|| region.base_url());
        let http = HttpClient::builder(host).timeout(options.timeout()).build()?;
        let headers = initial_headers::<S>(&options);

        log.log(&format!("app {}", options.app.map_or("none", |app| app.identifier())));

        Ok(Self {
            inner: Arc::new(ClientInner {
                options,
                region: RwLock::new(region),
                http: RwLock::new(http),
                headers: RwLock::new(headers),
                session: RwLock::new(Session::new()),
                cache,
                renewal: Mutex::new(None),
                epoch: AtomicU64::new(0),
                log,
                _strategy: PhantomData,
            }),
        })
    }

    /// Authenticate and return the user profile.
    ///
    /// # Errors
    ///
    /// Fails without touching the session when already logged in, when the
    /// credentials are unusable or when the handshake fails.
    #[instrument(skip(self), fields(client = S::NAME))]
    pub async fn login(&self) -> ApiResult<UserProfile> {
        if self.authorized() {
            return Err(self.error(ApiError::precondition("Already logged in")));
        }
        S::validate(&self.inner.options).map_err(|err| self.error(err))?;

        if let Some(session) = self.restore_from_cache().await {
            let user = self.install(session);
            info!(client = S::NAME, "session restored from cache");
            self.log(&format!("Restored session of \"{}\"", user.display_name()));
            self.arm_renewal(None);
            return Ok(user);
        }

        let handshake = S::handshake(self).await?;
        let user = self.adopt(handshake).await?;

        info!(client = S::NAME, "logged in");
        self.log(&format!("Successfully logged in as \"{}\"", user.display_name()));
        self.arm_renewal(None);
        Ok(user)
    }

    /// End the session. Returns `false` when there was none.
    pub fn logout(&self) -> bool {
        let logged_out = self.teardown(None);
        if logged_out {
            info!(client = S::NAME, "logged out");
            self.log("Successfully logged out");
        } else {
            self.log("Already logged out");
        }
        logged_out
    }

    /// Names of the operations this client exposes.
    #[must_use]
    pub fn get_methods(&self) -> Vec<&'static str> {
        BASE_METHODS.iter().chain(S::METHODS).copied().collect()
    }

    /// Snapshot of the current user profile.
    #[must_use]
    pub fn user(&self) -> UserProfile {
        self.inner.session.read().user().clone()
    }

    /// When the current credential lapses, `None` when unknown or logged out.
    #[must_use]
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.inner.session.read().expiration()
    }

    /// Options the client was built with.
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    /// Current region.
    #[must_use]
    pub fn state(&self) -> State {
        *self.inner.region.read()
    }

    /// Host requests are sent to. An explicit `host` option always wins.
    #[must_use]
    pub fn host(&self) -> String {
        self.inner.options.host.clone().unwrap_or_else(|| self.state().base_url())
    }

    /// Whether a keep-alive renewal is scheduled.
    #[must_use]
    pub fn renewal_pending(&self) -> bool {
        self.inner.renewal.lock().as_ref().is_some_and(RenewalTimer::is_pending)
    }

    /// Log `error` and hand it back. Every failure goes through here.
    pub(crate) fn error(&self, error: ApiError) -> ApiError {
        debug!(client = S::NAME, error = %error, status = error.status_code(), "request failed");
        self.log(&format!("An error happened: {error}"));
        error
    }

    /// Merge `headers` into the defaults sent with every request.
    pub(crate) fn set_headers(&self, headers: HeaderMap) {
        self.inner.headers.write().extend(headers);
    }

    pub(crate) fn set_region(&self, state: State) {
        *self.inner.region.write() = state;
    }

    /// Replace the transport with one bound to the current host.
    pub(crate) fn rebuild_http_client(&self) -> ApiResult<()> {
        let http = HttpClient::builder(self.host())
            .timeout(self.inner.options.timeout())
            .build()
            .map_err(|err| self.error(err))?;
        *self.inner.http.write() = http;
        debug!(client = S::NAME, host = %self.host(), "rebuilt HTTP client");
        Ok(())
    }

    /// Session cookie carried by `header` of `response`.
    pub(crate) fn get_cookie(&self, response: &RawResponse, header: &HeaderName) -> Option<String> {
        last_cookie(&response.headers, header)
    }

    /// Enrich the profile of the current session.
    pub(crate) fn update_user(&self, update: impl FnOnce(&mut UserProfile)) {
        let mut session = self.inner.session.write();
        if session.is_authorized() {
            update(session.user_mut());
        }
    }

    pub(crate) fn token(&self) -> String {
        self.inner.session.read().token().to_string()
    }

    /// Send one request with the default headers and read the whole response.
    ///
    /// With `authenticated` the session credential is attached. Per-call
    /// headers override both.
    pub(crate) async fn dispatch(
        &self,
        request: FetchRequest,
        authenticated: bool,
    ) -> ApiResult<RawResponse> {
        let http = self.inner.http.read().clone();
        let mut headers = self.inner.headers.read().clone();

        match &request.body {
            RequestBody::Json(_) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            RequestBody::Form(_) => {
                headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                );
            }
            RequestBody::Empty | RequestBody::Raw(_) => {}
        }

        if authenticated {
            if let Some((name, value)) = S::attach(self.inner.session.read().token()) {
                headers.insert(name, value);
            }
        }
        headers.extend(request.headers);

        let mut builder =
            http.request(request.method.clone(), &request.path).map_err(|err| self.error(err))?;
        builder = builder.headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if request.method != Method::GET {
            builder = match request.body {
                RequestBody::Empty => builder,
                RequestBody::Json(body) => builder.json(&body),
                RequestBody::Form(fields) => builder.form(&fields),
                RequestBody::Raw(body) => builder.body(body),
            };
        }

        let response = http.send(builder).await.map_err(|err| self.error(err))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|err| {
            self.error(ApiError::transport(
                status.as_u16(),
                format!("Could not read response body: {err}"),
            ))
        })?;

        Ok(RawResponse { status, headers, body: body.to_vec() })
    }

    /// Turn a response into its JSON payload or the uniform error.
    ///
    /// An embedded business error wins over the transport status.
    pub(crate) fn interpret(&self, response: &RawResponse) -> ApiResult<Value> {
        let status = response.status;
        let body = response.json();

        if let Some(err) = body.as_ref().and_then(|body| S::business_error(status, body)) {
            return Err(self.error(err));
        }

        if !status.is_success() {
            return Err(self.error(status_error(response)));
        }

        body.ok_or_else(|| self.error(ApiError::transport(status.as_u16(), "Could not parse JSON")))
    }

    /// Authenticated request returning the JSON payload.
    pub(crate) async fn fetch(&self, request: FetchRequest) -> ApiResult<Value> {
        let response = self.fetch_raw(request).await?;
        self.interpret(&response)
    }

    /// Authenticated request returning the body as text.
    pub(crate) async fn fetch_text(&self, request: FetchRequest) -> ApiResult<String> {
        let response = self.fetch_raw(request).await?;
        if !response.status.is_success() {
            return Err(self.error(status_error(&response)));
        }
        Ok(response.text())
    }

    /// Authenticated request returning the raw body bytes.
    pub(crate) async fn fetch_bytes(&self, request: FetchRequest) -> ApiResult<Vec<u8>> {
        let response = self.fetch_raw(request).await?;
        if !response.status.is_success() {
            return Err(self.error(status_error(&response)));
        }
        Ok(response.body)
    }

    /// Authenticated request with no interpretation of the response.
    pub(crate) async fn fetch_raw(&self, request: FetchRequest) -> ApiResult<RawResponse> {
        if !self.authorized() {
            return Err(self.error(ApiError::precondition("Not logged in")));
        }
        self.dispatch(request, true).await
    }

    /// Session stored in the cache. Anything unusable counts as absent.
    async fn restore_from_cache(&self) -> Option<Session> {
        let cache = self.inner.cache.as_ref()?;
        let snapshot = cache.load().await?;
        let Some(Handshake { token, expiration, user, .. }) = S::restore(&snapshot) else {
            debug!(client = S::NAME, "cached snapshot is not a usable login response");
            return None;
        };

        match Session::establish(token, expiration, user) {
            Ok(session) => Some(session),
            Err(err) => {
                debug!(client = S::NAME, error = %err, "ignoring unusable cached session");
                None
            }
        }
    }

    fn install(&self, session: Session) -> UserProfile {
        let user = session.user().clone();
        *self.inner.session.write() = session;
        user
    }

    /// Install the session described by `handshake` and persist its snapshot.
    async fn adopt(&self, handshake: Handshake) -> ApiResult<UserProfile> {
        let Handshake { token, expiration, user, snapshot } = handshake;
        let session = Session::establish(token, expiration, user).map_err(|err| self.error(err))?;
        let user = self.install(session);

        if let (Some(cache), Some(snapshot)) = (&self.inner.cache, snapshot) {
            cache.save(&snapshot).await;
            self.log("Saved session snapshot");
        }

        Ok(user)
    }

    /// Schedule the next renewal, replacing any pending one.
    ///
    /// `current` is the id of the timer whose task is calling; that timer is
    /// released instead of aborted.
    fn arm_renewal(&self, current: Option<u64>) {
        if !(S::RENEWS && self.inner.options.keep_alive) {
            return;
        }

        let expiration = self.inner.session.read().expiration();
        let delay = renewal_delay(expiration, &self.inner.options.renewal, Utc::now());
        let epoch = self.inner.epoch.load(Ordering::SeqCst);
        let weak = Arc::downgrade(&self.inner);

        let timer = RenewalTimer::arm(delay, move |timer_id| async move {
            if let Some(inner) = weak.upgrade() {
                SessionClient { inner }.renew(timer_id, epoch).await;
            }
        });

        info!(client = S::NAME, delay_secs = delay.as_secs(), "session renewal scheduled");

        let previous = self.inner.renewal.lock().replace(timer);
        release_timer(previous, current);
    }

    async fn renew(&self, timer_id: u64, epoch: u64) {
        if self.inner.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }

        info!(client = S::NAME, "renewing session");
        self.log("Renewing session");

        let outcome = S::handshake(self).await;

        if self.inner.epoch.load(Ordering::SeqCst) != epoch {
            debug!(client = S::NAME, "session ended during renewal, discarding result");
            return;
        }

        let previous = self.user();
        let outcome = match outcome {
            Ok(handshake) => self.adopt(handshake).await,
            Err(err) => Err(err),
        };
        if outcome.is_ok() {
            self.carry_enrichment(previous);
        }

        match outcome {
            Ok(_) => {
                info!(client = S::NAME, "session renewed");
                self.arm_renewal(Some(timer_id));
            }
            Err(err) if err.is_unauthorized() || !self.renewal_can_retry() => {
                warn!(client = S::NAME, error = %err, "session renewal failed, ending session");
                self.teardown(Some(timer_id));
            }
            Err(err) => {
                warn!(client = S::NAME, error = %err, "session renewal failed, keeping session");
                self.arm_renewal(Some(timer_id));
            }
        }
    }

    /// Keep the card-derived type and school across a renewal of the same user.
    fn carry_enrichment(&self, previous: UserProfile) {
        let mut session = self.inner.session.write();
        let user = session.user_mut();
        if user.ident.is_some() && user.ident == previous.ident {
            user.user_type = user.user_type.or(previous.user_type);
            if user.school.is_none() {
                user.school = previous.school;
            }
        }
    }

    fn renewal_can_retry(&self) -> bool {
        self.inner
            .session
            .read()
            .seconds_until_expiry()
            .map_or(true, |secs| secs > RENEWAL_RETRY_FLOOR_SECS)
    }

    /// Cancel renewal and clear the session. Returns whether one existed.
    fn teardown(&self, current: Option<u64>) -> bool {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        let previous = self.inner.renewal.lock().take();
        release_timer(previous, current);

        let mut session = self.inner.session.write();
        if !session.is_authorized() {
            return false;
        }
        session.clear();
        true
    }
}

fn release_timer(timer: Option<RenewalTimer>, current: Option<u64>) {
    match timer {
        Some(timer) if Some(timer.id()) == current => timer.detach(),
        Some(timer) => timer.cancel(),
        None => {}
    }
}

fn status_error(response: &RawResponse) -> ApiError {
    let status = response.status;
    ApiError::transport(
        status.as_u16(),
        format!(
            "The server returned an unexpected status: {}",
            status.canonical_reason().unwrap_or("unknown")
        ),
    )
}

fn initial_headers<S: SessionStrategy>(options: &ClientOptions) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(options.app.map_or("", |app| app.identifier())),
    );
    headers.insert(
        HeaderName::from_static(REQUESTED_WITH_HEADER),
        HeaderValue::from_static(REQUESTED_WITH),
    );

    S::customize_headers(options, &mut headers);
    headers
}

impl<S: SessionStrategy> Logging for SessionClient<S> {
    fn debug_enabled(&self) -> bool {
        self.inner.log.debug_enabled()
    }

    fn log(&self, message: &str) {
        self.inner.log.log(message);
    }
}

impl<S: SessionStrategy> AppIdentity for SessionClient<S> {
    fn app(&self) -> Option<App> {
        self.inner.options.app
    }
}

impl<S: SessionStrategy> Authorization for SessionClient<S> {
    fn authorized(&self) -> bool {
        self.inner.session.read().is_authorized()
    }
}
