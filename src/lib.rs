//! showcase_viewer - Asset cache, preloading and viewer lifecycle for 3D portfolios
//!
//! # Features
//! - Process-wide asset status cache with TTL expiry
//! - Deduplicated background preloading of project models
//! - Per-viewer load state machine where the latest request always wins
//! - Scene normalization into a fixed viewing volume
//! - GPU handle ownership and disposal through a backend trait
//! - Async runtime abstraction (Tokio or custom)
//!
//! # Quick Start
//!
//! ```ignore
//! use showcase_viewer::{AssetCache, GltfEngine, MemorySource, MockGpu, PreloadCoordinator,
//!     TokioSpawner, ViewerConfig, ViewerSession};
//!
//! let engine = Arc::new(GltfEngine::new(MemorySource::new()));
//! let coordinator = PreloadCoordinator::new(engine, AssetCache::default(), TokioSpawner::new());
//! coordinator.preload_all(&projects);
//!
//! let mut session = ViewerSession::new(coordinator, MockGpu::new(), ViewerConfig::default());
//! if let Some(request) = session.open("/models/drone.glb") {
//!     session.load(request).await;
//! }
//! ```
//!
//! # Feature Flags
//!
//! - `runtime-tokio`: Tokio spawner and the periodic cache sweeper (default)

// Core modules
pub mod cache;
pub mod engine;
pub mod preload;
pub mod viewer;

// Support modules
pub mod config;
pub mod gpu;
pub mod progress;
pub mod project;
pub mod runtime;
pub mod scene;

// Error types
mod error;
pub use error::{AssetError, ErrorKind, Result};

// Re-export cache types
pub use cache::metrics::{AssetMetrics, AssetMetricsHandle};
pub use cache::{AssetCache, AssetStatus, CacheEntry};

// Re-export configuration
pub use config::{CacheConfig, OrbitSettings, ViewerConfig};

// Re-export engine types
pub use engine::{
    AssetEngine, AssetSource, DirectorySource, GltfEngine, LoadFuture, MemorySource, MockEngine,
    WarmFuture,
};

// Re-export GPU types
pub use gpu::{GpuDevice, GpuError, GpuResult, MockGpu};

// Re-export runtime types
#[cfg(feature = "runtime-tokio")]
pub use runtime::TokioSpawner;
pub use runtime::{AsyncSpawner, BoxFuture, MockSpawner};

// Re-export domain types
pub use preload::PreloadCoordinator;
pub use progress::ProgressEstimator;
pub use project::{ModelFormat, ProjectRecord};
pub use scene::{Aabb, Material, Normalization, Scene, SceneMesh};
pub use viewer::{
    LoadOutcome, LoadRequest, RetryRejected, Transition, ViewerEvents, ViewerSession,
    ViewerState, ViewerView,
};

// Version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
