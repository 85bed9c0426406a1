//! Tokio async runtime implementation
//!
//! Provides integration with the Tokio async runtime.

use super::AsyncSpawner;
use std::future::Future;

/// Tokio-based async spawner
///
/// Spawns tasks on the current Tokio runtime. Outside a runtime the task is
/// run inline so preloads are never silently lost.
#[derive(Clone, Debug, Default, Copy)]
pub struct TokioSpawner;

impl TokioSpawner {
    /// Create a new Tokio spawner
    pub fn new() -> Self {
        Self
    }
}

impl AsyncSpawner for TokioSpawner {
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => {
                log::debug!("No Tokio runtime available, running task inline");
                futures::executor::block_on(task);
            }
        }
    }

    fn runtime_name(&self) -> &'static str {
        "Tokio"
    }
}
