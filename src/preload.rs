//! Background preloading of project models
//!
//! The coordinator warms the engine for URLs a user is likely to open next.
//! It is advisory: failures are logged and recorded in the cache, never
//! returned, and never retried without an explicit new request.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::hash::Hasher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use xxhash_rust::xxh3::Xxh3;

use crate::cache::{AssetCache, AssetStatus};
use crate::engine::AssetEngine;
use crate::error::AssetError;
use crate::project::ProjectRecord;
use crate::runtime::AsyncSpawner;

/// Deduplicates warm requests and records their outcome in the cache
pub struct PreloadCoordinator<E: AssetEngine, S: AsyncSpawner> {
    engine: Arc<E>,
    cache: AssetCache,
    spawner: S,
    /// URLs with a warm request in flight
    in_flight: Arc<Mutex<HashSet<String>>>,
    /// Fingerprint of the last project list passed to `preload_projects_if_changed`
    last_projects: Arc<Mutex<Option<u64>>>,
    enabled: Arc<AtomicBool>,
}

impl<E: AssetEngine, S: AsyncSpawner> Clone for PreloadCoordinator<E, S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            cache: self.cache.clone(),
            spawner: self.spawner.clone(),
            in_flight: Arc::clone(&self.in_flight),
            last_projects: Arc::clone(&self.last_projects),
            enabled: Arc::clone(&self.enabled),
        }
    }
}

impl<E: AssetEngine, S: AsyncSpawner> PreloadCoordinator<E, S> {
    pub fn new(engine: Arc<E>, cache: AssetCache, spawner: S) -> Self {
        Self {
            engine,
            cache,
            spawner,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            last_projects: Arc::new(Mutex::new(None)),
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Enable or disable preloading
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Check if preloading is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Check if a warm request for `url` is still running
    pub fn is_in_flight(&self, url: &str) -> bool {
        self.in_flight.lock().contains(url)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Warm the engine for `url` in the background.
    ///
    /// Returns `true` if a warm request was issued. Skips empty URLs, URLs
    /// already in flight and URLs the cache records as preloaded or loaded.
    pub fn preload(&self, url: &str) -> bool {
        if url.is_empty() || !self.is_enabled() {
            return false;
        }
        if self.cache.get(url).is_some_and(|entry| entry.is_warm()) {
            log::debug!("Skipping preload of {url}: already warm");
            return false;
        }
        if !self.in_flight.lock().insert(url.to_string()) {
            log::debug!("Skipping preload of {url}: already in flight");
            return false;
        }

        self.cache.metrics().record_preload_request();
        let warm = match self.engine.warm(url) {
            Ok(warm) => warm,
            Err(err) => {
                finish_preload(&self.cache, &self.in_flight, url, Err(err));
                return true;
            }
        };

        let cache = self.cache.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let url = url.to_string();
        self.spawner.spawn(async move {
            let result = warm.await;
            finish_preload(&cache, &in_flight, &url, result);
        });
        true
    }

    /// Preload every project that declares a model. Returns how many warm
    /// requests were issued.
    pub fn preload_all<'a>(&self, projects: impl IntoIterator<Item = &'a ProjectRecord>) -> usize {
        projects
            .into_iter()
            .filter_map(ProjectRecord::model_url)
            .filter(|url| self.preload(url))
            .count()
    }

    /// Preload a project list only if its models differ from the previous call.
    ///
    /// Returns `None` when the list is unchanged, otherwise the number of warm
    /// requests issued.
    pub fn preload_projects_if_changed(&self, projects: &[ProjectRecord]) -> Option<usize> {
        let fingerprint = fingerprint(projects);
        {
            let mut last = self.last_projects.lock();
            if *last == Some(fingerprint) {
                return None;
            }
            *last = Some(fingerprint);
        }
        Some(self.preload_all(projects))
    }

    /// Record that a viewer displayed `url`
    pub fn record_loaded(&self, url: &str) {
        self.cache.record_status(url, AssetStatus::Loaded);
    }

    /// Record that a viewer failed to display `url`
    pub fn record_failed(&self, url: &str, error: AssetError) {
        self.cache.metrics().record_load_failure();
        self.cache.record_status(url, AssetStatus::Failed(error));
    }
}

fn finish_preload(
    cache: &AssetCache,
    in_flight: &Mutex<HashSet<String>>,
    url: &str,
    result: crate::error::Result<()>,
) {
    match result {
        Ok(()) => cache.record_status(url, AssetStatus::Preloaded),
        Err(err) => {
            log::warn!("Failed to preload model {url}: {err}");
            cache.metrics().record_preload_failure();
            cache.record_status(url, AssetStatus::Failed(err));
        }
    }
    in_flight.lock().remove(url);
}

fn fingerprint(projects: &[ProjectRecord]) -> u64 {
    let mut hasher = Xxh3::new();
    for url in projects.iter().filter_map(ProjectRecord::model_url) {
        hasher.write(url.as_bytes());
        hasher.write_u8(0);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use crate::runtime::MockSpawner;
    use crate::scene::Scene;
    use glam::Vec3;

    fn setup(spawner: MockSpawner) -> (Arc<MockEngine>, PreloadCoordinator<MockEngine, MockSpawner>) {
        let engine = Arc::new(MockEngine::new());
        engine.insert_scene("/models/a.glb", Scene::cuboid(Vec3::ZERO, Vec3::ONE));
        let coordinator = PreloadCoordinator::new(Arc::clone(&engine), AssetCache::default(), spawner);
        (engine, coordinator)
    }

    #[test]
    fn test_empty_url_is_ignored() {
        let (engine, coordinator) = setup(MockSpawner::blocking());
        assert!(!coordinator.preload(""));
        assert_eq!(engine.total_warm_count(), 0);
    }

    #[test]
    fn test_disabled_coordinator_skips() {
        let (engine, coordinator) = setup(MockSpawner::blocking());
        coordinator.set_enabled(false);
        assert!(!coordinator.preload("/models/a.glb"));
        assert_eq!(engine.total_warm_count(), 0);
    }

    #[test]
    fn test_in_flight_until_complete() {
        let spawner = MockSpawner::deferred();
        let (_engine, coordinator) = setup(spawner.clone());

        assert!(coordinator.preload("/models/a.glb"));
        assert!(coordinator.is_in_flight("/models/a.glb"));
        assert!(!coordinator.cache().contains("/models/a.glb"));

        spawner.run_pending();
        assert!(!coordinator.is_in_flight("/models/a.glb"));
        assert_eq!(
            coordinator.cache().get("/models/a.glb").unwrap().status,
            AssetStatus::Preloaded
        );
    }

    #[test]
    fn test_fingerprint_tracks_model_urls() {
        let a = vec![ProjectRecord::new("A").with_model("/models/a.glb")];
        let renamed = vec![ProjectRecord::new("Renamed").with_model("/models/a.glb")];
        let b = vec![ProjectRecord::new("B").with_model("/models/b.glb")];

        assert_eq!(fingerprint(&a), fingerprint(&renamed));
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }
}
