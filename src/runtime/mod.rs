//! Async runtime abstraction for background preload work
//!
//! Preloading is fire-and-forget: the coordinator hands a future to an
//! [`AsyncSpawner`] and never awaits it. Hosts plug in Tokio, a browser
//! microtask queue, or the mock spawner in tests.

pub mod mock;
#[cfg(feature = "runtime-tokio")]
pub mod tokio_impl;

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

/// A boxed future that can be sent across threads
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Async task spawner trait
///
/// # Example
/// ```ignore
/// let spawner = TokioSpawner::new();
/// spawner.spawn(async {
///     // Background work here
/// });
/// ```
pub trait AsyncSpawner: Send + Sync + Clone + Debug + 'static {
    /// Spawn a detached task
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Get the name of this runtime (for debugging)
    fn runtime_name(&self) -> &'static str;
}

// Re-export implementations
pub use mock::{MockSpawnBehavior, MockSpawner};

#[cfg(feature = "runtime-tokio")]
pub use tokio_impl::TokioSpawner;
