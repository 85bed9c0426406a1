//! Mock async spawner for testing
//!
//! Tasks can be dropped, run inline, or parked until the test releases them,
//! which lets tests observe work that is still in flight.

use super::{AsyncSpawner, BoxFuture};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;

/// Spawn behavior for MockSpawner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockSpawnBehavior {
    /// Drop tasks immediately (don't execute)
    Drop,
    /// Block on tasks synchronously using a simple executor
    BlockSync,
    /// Queue tasks until [`MockSpawner::run_pending`] is called
    Deferred,
}

/// Mock async spawner for testing
#[derive(Clone)]
pub struct MockSpawner {
    behavior: MockSpawnBehavior,
    pending: Arc<Mutex<Vec<BoxFuture<'static, ()>>>>,
}

impl std::fmt::Debug for MockSpawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSpawner")
            .field("behavior", &self.behavior)
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl Default for MockSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSpawner {
    /// Create a new mock spawner that drops tasks
    pub fn new() -> Self {
        Self::with_behavior(MockSpawnBehavior::Drop)
    }

    /// Create a mock spawner with specific behavior
    pub fn with_behavior(behavior: MockSpawnBehavior) -> Self {
        Self {
            behavior,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock spawner that runs tasks synchronously
    pub fn blocking() -> Self {
        Self::with_behavior(MockSpawnBehavior::BlockSync)
    }

    /// Create a mock spawner that parks tasks until released
    pub fn deferred() -> Self {
        Self::with_behavior(MockSpawnBehavior::Deferred)
    }

    /// Number of parked tasks
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Run every parked task to completion, including tasks they spawn.
    /// Returns how many tasks ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // Release the lock before running so tasks can spawn more work
            let tasks = std::mem::take(&mut *self.pending.lock());
            if tasks.is_empty() {
                return ran;
            }
            for task in tasks {
                futures::executor::block_on(task);
                ran += 1;
            }
        }
    }
}

impl AsyncSpawner for MockSpawner {
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.behavior {
            MockSpawnBehavior::Drop => drop(task),
            MockSpawnBehavior::BlockSync => futures::executor::block_on(task),
            MockSpawnBehavior::Deferred => self.pending.lock().push(Box::pin(task)),
        }
    }

    fn runtime_name(&self) -> &'static str {
        "Mock"
    }
}
