//! Shared helpers for the client integration tests
//!
//! Every test gets its own `MockServer`; options point the client at it and
//! keep the session cache inside a temporary directory.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Duration;
use classeviva_common::testing::login_payload;
use classeviva_infra::{ClientOptions, RenewalConfig};
use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate, Times};

pub const REST_LOGIN: &str = "/rest/v1/auth/login/";
pub const WEB_LOGIN: &str = "/auth-p7/app/default/AuthApi4.php";
pub const SSO_LOGIN: &str = "/home/app/default/login-sso.php";

/// Mock backend plus a scratch directory for the session cache.
pub struct TestBackend {
    pub server: MockServer,
    dir: TempDir,
}

impl TestBackend {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            dir: tempfile::tempdir().expect("temp dir should be created"),
        }
    }

    /// Host with a trailing slash, as the clients expect it.
    pub fn host(&self) -> String {
        format!("{}/", self.server.uri())
    }

    pub fn cache_path(&self) -> PathBuf {
        self.dir.path().join("cvv.json")
    }

    /// Options for this backend with caching on and renewal off.
    pub fn options(&self, username: &str, password: &str) -> ClientOptions {
        ClientOptions::new(username, password)
            .with_host(self.host())
            .with_cache_path(self.cache_path())
            .with_keep_alive(false)
    }

    /// Options with keep-alive on and the given renewal lead.
    pub fn renewing_options(&self, lead_secs: u64) -> ClientOptions {
        self.options("S1234567", "secret")
            .with_keep_alive(true)
            .with_renewal(RenewalConfig { lead_secs, fallback_period_secs: 5400 })
    }

    /// Answer `POST /rest/v1/auth/login/` with `body`.
    pub async fn mount_rest_login(&self, body: Value, expected_calls: impl Into<Times>) {
        Mock::given(method("POST"))
            .and(path(REST_LOGIN))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// Answer the REST login with a token valid for `valid_for`.
    pub async fn mount_rest_success(
        &self,
        valid_for: Duration,
        expected_calls: impl Into<Times>,
    ) {
        self.mount_rest_login(login_payload(valid_for), expected_calls).await;
    }
}

/// Diagnostic messages captured through the client's log sink.
#[derive(Clone, Default)]
pub struct LogHandle {
    records: Arc<Mutex<Vec<String>>>,
}

impl LogHandle {
    /// Attach this handle to `options` and turn debug logging on.
    pub fn attach(&self, options: ClientOptions) -> ClientOptions {
        let records = Arc::clone(&self.records);
        options.with_debug(true).with_log_sink(move |message| {
            records.lock().expect("log mutex poisoned").push(message.to_string());
        })
    }

    pub fn entries(&self) -> Vec<String> {
        self.records.lock().expect("log mutex poisoned").clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries().iter().any(|entry| entry.contains(needle))
    }
}
