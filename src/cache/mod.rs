//! Process-wide asset status cache with TTL expiry
//!
//! The cache records what happened to each asset URL: warmed, loaded by a
//! viewer, or failed. It never holds scene data or GPU resources, so expiring
//! an entry only changes future preload decisions.
//!
//! Construct one [`AssetCache`] at startup and clone the handle into every
//! component that needs it; clones share the same map.

pub mod metrics;

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::config::CacheConfig;
use crate::error::AssetError;
use metrics::AssetMetricsHandle;

/// Outcome recorded for an asset
#[derive(Debug, Clone, PartialEq)]
pub enum AssetStatus {
    /// The engine finished warming the asset
    Preloaded,
    /// A viewer displayed the asset
    Loaded,
    /// Warming or loading failed
    Failed(AssetError),
}

/// One record per asset URL
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub status: AssetStatus,
    /// Time of the last status change
    pub timestamp: Instant,
}

impl CacheEntry {
    /// The recorded error, present only for failed entries
    pub fn error(&self) -> Option<&AssetError> {
        match &self.status {
            AssetStatus::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Whether the engine already holds this asset
    pub fn is_warm(&self) -> bool {
        matches!(self.status, AssetStatus::Preloaded | AssetStatus::Loaded)
    }
}

/// Shared map from asset URL to its latest status
#[derive(Debug, Clone)]
pub struct AssetCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    config: CacheConfig,
    last_sweep: Arc<Mutex<Instant>>,
    metrics: AssetMetricsHandle,
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl AssetCache {
    /// Creates an empty cache with the given expiry settings
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            config,
            last_sweep: Arc::new(Mutex::new(Instant::now())),
            metrics: AssetMetricsHandle::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a reference to the metrics handle
    pub fn metrics(&self) -> &AssetMetricsHandle {
        &self.metrics
    }

    /// Insert or overwrite the entry for `url`, stamped with the current time
    pub fn record_status(&self, url: &str, status: AssetStatus) {
        self.record_status_at(url, status, Instant::now());
    }

    /// Insert or overwrite the entry for `url` with an explicit timestamp
    pub fn record_status_at(&self, url: &str, status: AssetStatus, timestamp: Instant) {
        log::debug!("Cache status for {url}: {status:?}");
        self.entries
            .write()
            .insert(url.to_string(), CacheEntry { status, timestamp });
    }

    pub fn get(&self, url: &str) -> Option<CacheEntry> {
        self.entries.read().get(url).cloned()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.read().contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Clears all entries
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Remove every entry older than the TTL at `now`. Returns how many were
    /// removed.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let ttl = self.config.ttl;
        let removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|_, entry| now.saturating_duration_since(entry.timestamp) <= ttl);
            before - entries.len()
        };
        *self.last_sweep.lock() = now;

        if removed > 0 {
            log::info!("Swept {removed} expired asset cache entries");
            self.metrics.record_swept(removed);
        }
        removed
    }

    /// Sweep if at least one sweep interval has passed since the last sweep.
    ///
    /// For hosts that drive their own event loop instead of
    /// [`AssetCache::spawn_sweeper`].
    pub fn tick(&self, now: Instant) -> Option<usize> {
        let due = now.saturating_duration_since(*self.last_sweep.lock()) >= self.config.sweep_interval;
        due.then(|| self.sweep_expired(now))
    }

    /// Run the sweep every `sweep_interval` on the current Tokio runtime.
    ///
    /// The task holds a clone of the cache; abort the returned handle at
    /// shutdown.
    #[cfg(feature = "runtime-tokio")]
    pub fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let cache = self.clone();
        let period = self.config.sweep_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                cache.sweep_expired(Instant::now());
            }
        })
    }
}
