//! Best-effort persistence of the last login response
//!
//! A [`CachedSnapshot`] is the login response body exactly as the backend sent
//! it, including its `expire` timestamp. [`SessionCache::load`] never fails:
//! a missing, unreadable, malformed or expired snapshot is simply absent.
//! [`SessionCache::save`] never fails either: write errors are logged and the
//! freshly obtained session stays valid in memory.
//!
//! The file location is an explicit value handed to [`FileSessionCache::new`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Internal cache failures. Only ever logged.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache content is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("snapshot expired at {0}")]
    Expired(DateTime<FixedOffset>),
}

/// Durable copy of a login response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    /// Expiry reported by the backend, with its original offset
    pub expire: DateTime<FixedOffset>,
    /// Every other field of the response, verbatim
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl CachedSnapshot {
    /// Build a snapshot from a raw login response.
    ///
    /// Returns `None` when the body is not an object or has no parseable
    /// `expire` field.
    #[must_use]
    pub fn from_response(body: &Value) -> Option<Self> {
        serde_json::from_value(body.clone()).ok()
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expire.with_timezone(&Utc)
    }

    /// Usable only while `now` is strictly before the expiry.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }

    /// Decode the snapshot (expire included) into a typed login response.
    ///
    /// # Errors
    ///
    /// Returns the serde error when the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::to_value(self).and_then(serde_json::from_value)
    }
}

/// Storage for the last login snapshot
#[async_trait]
pub trait SessionCache: Send + Sync + std::fmt::Debug {
    /// Read a still-valid snapshot, `None` otherwise.
    async fn load(&self) -> Option<CachedSnapshot>;

    /// Replace the stored snapshot. Failures are logged, not returned.
    async fn save(&self, snapshot: &CachedSnapshot);
}

/// JSON file backed [`SessionCache`]
#[derive(Debug, Clone)]
pub struct FileSessionCache {
    path: PathBuf,
}

impl FileSessionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn try_load(&self) -> Result<CachedSnapshot, CacheError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let snapshot: CachedSnapshot = serde_json::from_str(&raw)?;

        if !snapshot.is_valid_at(Utc::now()) {
            return Err(CacheError::Expired(snapshot.expire));
        }

        Ok(snapshot)
    }

    async fn try_save(&self, snapshot: &CachedSnapshot) -> Result<(), CacheError> {
        let body = serde_json::to_string_pretty(snapshot)?;

        // Write next to the target, then rename over it.
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        tokio::fs::write(&staging, body).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionCache for FileSessionCache {
    async fn load(&self) -> Option<CachedSnapshot> {
        match self.try_load().await {
            Ok(snapshot) => {
                debug!(path = %self.path.display(), expire = %snapshot.expire, "session cache hit");
                Some(snapshot)
            }
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "session cache miss");
                None
            }
        }
    }

    async fn save(&self, snapshot: &CachedSnapshot) {
        match self.try_save(snapshot).await {
            Ok(()) => info!(path = %self.path.display(), "saved session snapshot"),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to save session snapshot");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    fn response(expire: DateTime<Utc>) -> Value {
        json!({
            "ident": "S123X",
            "firstName": "A",
            "lastName": "B",
            "token": "abc",
            "release": "2024-01-01T00:00:00+01:00",
            "expire": expire.with_timezone(&FixedOffset::east_opt(3600).unwrap()).to_rfc3339(),
        })
    }

    #[test]
    fn snapshot_keeps_payload_verbatim() {
        let body = response(Utc::now() + Duration::hours(1));
        let snapshot = CachedSnapshot::from_response(&body).unwrap();

        assert_eq!(snapshot.payload.get("token"), Some(&json!("abc")));
        assert!(!snapshot.payload.contains_key("expire"));

        let back: Value = snapshot.decode().unwrap();
        assert_eq!(back["ident"], json!("S123X"));
        assert!(back["expire"].is_string());
    }

    #[test]
    fn snapshot_requires_expire() {
        assert!(CachedSnapshot::from_response(&json!({ "token": "abc" })).is_none());
        assert!(CachedSnapshot::from_response(&json!({ "expire": "tomorrow" })).is_none());
        assert!(CachedSnapshot::from_response(&json!("nope")).is_none());
    }

    #[tokio::test]
    async fn save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileSessionCache::new(dir.path().join("cvv.json"));
        let snapshot =
            CachedSnapshot::from_response(&response(Utc::now() + Duration::hours(1))).unwrap();

        cache.save(&snapshot).await;
        let loaded = cache.load().await.unwrap();

        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn expired_snapshot_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileSessionCache::new(dir.path().join("cvv.json"));
        let snapshot =
            CachedSnapshot::from_response(&response(Utc::now() - Duration::minutes(5))).unwrap();

        cache.save(&snapshot).await;

        assert!(cache.load().await.is_none());
    }

    #[tokio::test]
    async fn missing_or_corrupt_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cvv.json");
        let cache = FileSessionCache::new(&path);

        assert!(cache.load().await.is_none());

        tokio::fs::write(&path, "{ not json").await.unwrap();
        assert!(cache.load().await.is_none());
    }

    #[tokio::test]
    async fn save_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileSessionCache::new(dir.path().join("missing").join("cvv.json"));
        let snapshot =
            CachedSnapshot::from_response(&response(Utc::now() + Duration::hours(1))).unwrap();

        cache.save(&snapshot).await;

        assert!(cache.load().await.is_none());
    }

    #[tokio::test]
    async fn save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileSessionCache::new(dir.path().join("cvv.json"));

        let first =
            CachedSnapshot::from_response(&response(Utc::now() + Duration::hours(1))).unwrap();
        let mut second_body = response(Utc::now() + Duration::hours(2));
        second_body["token"] = json!("def");
        let second = CachedSnapshot::from_response(&second_body).unwrap();

        cache.save(&first).await;
        cache.save(&second).await;

        let loaded = cache.load().await.unwrap();
        assert_eq!(loaded.payload.get("token"), Some(&json!("def")));
    }
}
