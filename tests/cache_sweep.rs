//! Integration tests for asset cache expiry

use showcase_viewer::{AssetCache, AssetError, AssetStatus, CacheConfig};
use std::time::{Duration, Instant};

#[test]
fn test_sweep_removes_only_expired_entries() {
    let cache = AssetCache::default();
    let start = Instant::now();

    cache.record_status_at("/models/old.glb", AssetStatus::Preloaded, start);
    cache.record_status_at(
        "/models/fresh.glb",
        AssetStatus::Loaded,
        start + Duration::from_secs(120),
    );

    // Six and four minutes old at sweep time
    let removed = cache.sweep_expired(start + Duration::from_secs(360));
    assert_eq!(removed, 1);
    assert!(!cache.contains("/models/old.glb"));
    assert!(cache.contains("/models/fresh.glb"));
    assert_eq!(cache.metrics().swept_entries(), 1);
}

#[test]
fn test_entry_at_exact_ttl_survives() {
    let cache = AssetCache::default();
    let start = Instant::now();
    cache.record_status_at("/models/a.glb", AssetStatus::Preloaded, start);

    assert_eq!(cache.sweep_expired(start + Duration::from_secs(300)), 0);
    assert_eq!(cache.sweep_expired(start + Duration::from_secs(301)), 1);
    assert!(cache.is_empty());
}

#[test]
fn test_failed_entries_expire_too() {
    let cache = AssetCache::default();
    let start = Instant::now();
    cache.record_status_at(
        "/models/broken.glb",
        AssetStatus::Failed(AssetError::Fetch("404".to_string())),
        start,
    );

    let entry = cache.get("/models/broken.glb").unwrap();
    assert_eq!(entry.error(), Some(&AssetError::Fetch("404".to_string())));
    assert!(!entry.is_warm());

    cache.sweep_expired(start + Duration::from_secs(600));
    assert!(cache.get("/models/broken.glb").is_none());
}

#[test]
fn test_tick_respects_sweep_interval() {
    let config = CacheConfig::default()
        .with_ttl(Duration::from_secs(10))
        .with_sweep_interval(Duration::from_secs(60));
    let cache = AssetCache::new(config);
    let start = Instant::now();
    cache.record_status_at("/models/a.glb", AssetStatus::Preloaded, start);

    assert_eq!(cache.tick(start + Duration::from_secs(30)), None);
    assert!(cache.contains("/models/a.glb"));

    assert_eq!(cache.tick(start + Duration::from_secs(61)), Some(1));
    assert!(cache.is_empty());
}

#[test]
fn test_clones_share_entries() {
    let cache = AssetCache::default();
    let other = cache.clone();

    cache.record_status("/models/a.glb", AssetStatus::Loaded);
    assert_eq!(other.get("/models/a.glb").unwrap().status, AssetStatus::Loaded);

    other.clear();
    assert!(cache.is_empty());
}

#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn test_background_sweeper() {
    let config = CacheConfig::default()
        .with_ttl(Duration::ZERO)
        .with_sweep_interval(Duration::from_millis(50));
    let cache = AssetCache::new(config);
    cache.record_status_at(
        "/models/a.glb",
        AssetStatus::Preloaded,
        Instant::now() - Duration::from_secs(1),
    );

    let sweeper = cache.spawn_sweeper();
    tokio::time::sleep(Duration::from_millis(120)).await;
    sweeper.abort();

    assert!(cache.is_empty());
}
