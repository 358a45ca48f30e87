//! Client construction options
//!
//! [`ClientOptions`] is shared by the three clients. It deserializes from TOML
//! or JSON (see `classeviva_infra::config::loader`) and can be built in code
//! with the `with_*` helpers.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capabilities::LogSink;
use crate::constants::{
    DEFAULT_CACHE_FILE, DEFAULT_RENEWAL_FALLBACK_SECS, DEFAULT_RENEWAL_LEAD_SECS,
    DEFAULT_TIMEOUT_SECS,
};
use crate::types::{App, State};

/// Timing of the keep-alive renewal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenewalConfig {
    /// Re-login this many seconds before the token expires
    pub lead_secs: u64,
    /// Re-login period when no expiry is known
    pub fallback_period_secs: u64,
}

impl Default for RenewalConfig {
    fn default() -> Self {
        Self {
            lead_secs: DEFAULT_RENEWAL_LEAD_SECS,
            fallback_period_secs: DEFAULT_RENEWAL_FALLBACK_SECS,
        }
    }
}

impl RenewalConfig {
    #[must_use]
    pub fn lead(&self) -> Duration {
        Duration::from_secs(self.lead_secs)
    }

    #[must_use]
    pub fn fallback_period(&self) -> Duration {
        Duration::from_secs(self.fallback_period_secs)
    }
}

/// Options recognized by every session client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Username, or e-mail for the social messaging client
    #[serde(alias = "email")]
    pub username: String,
    pub password: String,
    pub state: State,
    pub app: Option<App>,
    /// Overrides the host derived from `state`
    pub host: Option<String>,
    /// Enables diagnostic logging
    pub debug: bool,
    /// Persist the login response to `cache_path`
    #[serde(alias = "saveTempFile")]
    pub save_temp_file: bool,
    /// Re-login automatically before the token lapses
    #[serde(alias = "keepAlive")]
    pub keep_alive: bool,
    pub cache_path: PathBuf,
    pub timeout_secs: u64,
    pub renewal: RenewalConfig,
    #[serde(skip)]
    pub log_sink: Option<LogSink>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            state: State::default(),
            app: Some(App::default()),
            host: None,
            debug: false,
            save_temp_file: true,
            keep_alive: true,
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            renewal: RenewalConfig::default(),
            log_sink: None,
        }
    }
}

impl ClientOptions {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn with_app(mut self, app: Option<App>) -> Self {
        self.app = app;
        self
    }

    /// Point the client at a different host (tests, proxies).
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_save_temp_file(mut self, enabled: bool) -> Self {
        self.save_temp_file = enabled;
        self
    }

    #[must_use]
    pub fn with_keep_alive(mut self, enabled: bool) -> Self {
        self.keep_alive = enabled;
        self
    }

    #[must_use]
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    #[must_use]
    pub fn with_renewal(mut self, renewal: RenewalConfig) -> Self {
        self.renewal = renewal;
        self
    }

    /// Send diagnostic messages to `sink` instead of `tracing`.
    #[must_use]
    pub fn with_log_sink(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.log_sink = Some(LogSink::new(sink));
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}
