use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counters for preloading, loading and cache expiry
#[derive(Debug, Default)]
pub struct AssetMetrics {
    load_times: RwLock<HashMap<String, Duration>>,
    preload_requests: AtomicU64,
    preload_failures: AtomicU64,
    loads_completed: AtomicU64,
    load_failures: AtomicU64,
    swept_entries: AtomicU64,
}

impl AssetMetrics {
    /// Create a new instance of AssetMetrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warm request issued to the engine
    pub fn record_preload_request(&self) {
        self.preload_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed warm request
    pub fn record_preload_failure(&self) {
        self.preload_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a viewer load that reached the ready state
    pub fn record_load(&self, url: &str, duration: Duration) {
        self.loads_completed.fetch_add(1, Ordering::Relaxed);
        self.load_times.write().insert(url.to_string(), duration);
    }

    /// Record a viewer load that ended in the error state
    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record entries removed by a sweep
    pub fn record_swept(&self, count: usize) {
        self.swept_entries.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn preload_requests(&self) -> u64 {
        self.preload_requests.load(Ordering::Relaxed)
    }

    pub fn preload_failures(&self) -> u64 {
        self.preload_failures.load(Ordering::Relaxed)
    }

    pub fn loads_completed(&self) -> u64 {
        self.loads_completed.load(Ordering::Relaxed)
    }

    pub fn load_failures(&self) -> u64 {
        self.load_failures.load(Ordering::Relaxed)
    }

    pub fn swept_entries(&self) -> u64 {
        self.swept_entries.load(Ordering::Relaxed)
    }

    /// Get the preload failure rate as a percentage
    pub fn preload_failure_rate(&self) -> f32 {
        let requests = self.preload_requests() as f32;
        if requests > 0.0 {
            self.preload_failures() as f32 / requests * 100.0
        } else {
            0.0
        }
    }

    /// Get the most recent load time for an asset
    pub fn last_load_time(&self, url: &str) -> Option<Duration> {
        self.load_times.read().get(url).copied()
    }

    /// Get all recorded load times
    pub fn all_load_times(&self) -> HashMap<String, Duration> {
        self.load_times.read().clone()
    }
}

/// A thread-safe wrapper around AssetMetrics
#[derive(Debug, Clone, Default)]
pub struct AssetMetricsHandle(Arc<AssetMetrics>);

impl AssetMetricsHandle {
    /// Create a new metrics handle
    pub fn new() -> Self {
        Self(Arc::new(AssetMetrics::new()))
    }

    /// Get a reference to the underlying metrics
    pub fn inner(&self) -> &AssetMetrics {
        &self.0
    }
}

impl std::ops::Deref for AssetMetricsHandle {
    type Target = AssetMetrics;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_rate() {
        let metrics = AssetMetricsHandle::new();
        assert_eq!(metrics.preload_failure_rate(), 0.0);

        metrics.record_preload_request();
        metrics.record_preload_request();
        metrics.record_preload_failure();
        assert_eq!(metrics.preload_failure_rate(), 50.0);
    }

    #[test]
    fn test_load_times() {
        let metrics = AssetMetricsHandle::new();
        metrics.record_load("/models/a.glb", Duration::from_millis(40));
        metrics.record_load("/models/a.glb", Duration::from_millis(25));

        assert_eq!(metrics.loads_completed(), 2);
        assert_eq!(
            metrics.last_load_time("/models/a.glb"),
            Some(Duration::from_millis(25))
        );
        assert_eq!(metrics.last_load_time("/models/b.glb"), None);
    }
}
