//! Mock asset engine for testing
//!
//! Serves registered scenes, can fail synchronously or asynchronously per URL,
//! and counts every warm and load call.

use super::{AssetEngine, LoadFuture, WarmFuture};
use crate::error::{AssetError, Result};
use crate::scene::Scene;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum MockAsset {
    Scene(Scene),
    /// The returned future resolves to this error
    FailAsync(AssetError),
    /// The call itself returns this error
    FailSync(AssetError),
}

/// Mock asset engine
#[derive(Debug, Default)]
pub struct MockEngine {
    assets: RwLock<HashMap<String, MockAsset>>,
    warm_calls: RwLock<HashMap<String, usize>>,
    load_calls: RwLock<HashMap<String, usize>>,
}

impl MockEngine {
    /// Create an engine that knows no assets
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `scene` for `url`
    pub fn insert_scene(&self, url: impl Into<String>, scene: Scene) {
        self.assets.write().insert(url.into(), MockAsset::Scene(scene));
    }

    /// Make `url` fail through the returned future
    pub fn fail_async(&self, url: impl Into<String>, error: AssetError) {
        self.assets
            .write()
            .insert(url.into(), MockAsset::FailAsync(error));
    }

    /// Make `url` fail before any future is returned
    pub fn fail_sync(&self, url: impl Into<String>, error: AssetError) {
        self.assets
            .write()
            .insert(url.into(), MockAsset::FailSync(error));
    }

    /// Number of warm requests issued for `url`
    pub fn warm_count(&self, url: &str) -> usize {
        self.warm_calls.read().get(url).copied().unwrap_or(0)
    }

    /// Number of load requests issued for `url`
    pub fn load_count(&self, url: &str) -> usize {
        self.load_calls.read().get(url).copied().unwrap_or(0)
    }

    /// Warm requests across all URLs
    pub fn total_warm_count(&self) -> usize {
        self.warm_calls.read().values().sum()
    }

    /// Load requests across all URLs
    pub fn total_load_count(&self) -> usize {
        self.load_calls.read().values().sum()
    }

    fn lookup(&self, url: &str) -> Result<Result<Scene>> {
        match self.assets.read().get(url) {
            Some(MockAsset::Scene(scene)) => Ok(Ok(scene.clone())),
            Some(MockAsset::FailAsync(err)) => Ok(Err(err.clone())),
            Some(MockAsset::FailSync(err)) => Err(err.clone()),
            None => Ok(Err(AssetError::Fetch(format!("{url} not found")))),
        }
    }
}

impl AssetEngine for MockEngine {
    fn warm(&self, url: &str) -> Result<WarmFuture> {
        *self.warm_calls.write().entry(url.to_string()).or_insert(0) += 1;
        let result = self.lookup(url)?.map(|_| ());
        Ok(Box::pin(async move { result }))
    }

    fn begin_load(&self, url: &str) -> Result<LoadFuture> {
        *self.load_calls.write().entry(url.to_string()).or_insert(0) += 1;
        let result = self.lookup(url)?;
        Ok(Box::pin(async move { result }))
    }

    fn engine_name(&self) -> &'static str {
        "Mock"
    }
}
