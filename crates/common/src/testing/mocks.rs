//! Mock implementations of the session traits
//!
//! Provides in-memory stand-ins for testing purposes.

#![allow(clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::session::{CachedSnapshot, SessionCache};

/// In-memory [`SessionCache`] that counts reads and writes
///
/// Expired snapshots are stored but never returned, like the file cache.
///
/// # Examples
///
/// ```
/// use classeviva_common::testing::MemorySessionCache;
///
/// let cache = MemorySessionCache::new();
/// assert_eq!(cache.load_count(), 0);
/// assert!(cache.stored().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySessionCache {
    stored: Arc<Mutex<Option<CachedSnapshot>>>,
    loads: Arc<AtomicUsize>,
    saves: Arc<AtomicUsize>,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache pre-populated with `snapshot`.
    pub fn with_snapshot(snapshot: CachedSnapshot) -> Self {
        let cache = Self::new();
        *cache.stored.lock() = Some(snapshot);
        cache
    }

    /// The stored snapshot, expired or not.
    pub fn stored(&self) -> Option<CachedSnapshot> {
        self.stored.lock().clone()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn load(&self) -> Option<CachedSnapshot> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.stored.lock().clone().filter(|snapshot| snapshot.is_valid_at(Utc::now()))
    }

    async fn save(&self, snapshot: &CachedSnapshot) {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.stored.lock() = Some(snapshot.clone());
    }
}
