//! Asset engine seam
//!
//! An [`AssetEngine`] fetches and parses model files. The viewer never looks
//! inside asset bytes; it only sees the [`Scene`] an engine produces.
//!
//! Both entry points can fail twice: synchronously, before any work starts,
//! and asynchronously through the returned future. Callers in this crate treat
//! the two identically.

pub mod gltf;
pub mod mock;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::error::{AssetError, Result};
use crate::runtime::BoxFuture;
use crate::scene::Scene;

pub use self::gltf::GltfEngine;
pub use mock::MockEngine;

/// Future resolving once an engine has warmed its own cache for a URL
pub type WarmFuture = BoxFuture<'static, Result<()>>;

/// Future resolving to a freshly parsed copy of a scene
pub type LoadFuture = BoxFuture<'static, Result<Scene>>;

/// The external fetch/parse engine
pub trait AssetEngine: Send + Sync + 'static {
    /// Start warming the engine's cache for `url`
    fn warm(&self, url: &str) -> Result<WarmFuture>;

    /// Start loading `url`; every successful load yields an independent copy
    fn begin_load(&self, url: &str) -> Result<LoadFuture>;

    /// Name of this engine (for debugging)
    fn engine_name(&self) -> &'static str;
}

impl<E: AssetEngine + ?Sized> AssetEngine for Arc<E> {
    fn warm(&self, url: &str) -> Result<WarmFuture> {
        (**self).warm(url)
    }

    fn begin_load(&self, url: &str) -> Result<LoadFuture> {
        (**self).begin_load(url)
    }

    fn engine_name(&self) -> &'static str {
        (**self).engine_name()
    }
}

/// Where asset bytes come from
pub trait AssetSource: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>>>;
}

/// Serves site-relative URLs such as `/models/drone.glb` from a directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a URL to a file under the root, refusing to leave it
    pub fn resolve(&self, url: &str) -> Result<PathBuf> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let relative = Path::new(path.trim_start_matches('/'));

        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(AssetError::Fetch(format!(
                        "{url} escapes the asset directory"
                    )))
                }
            }
        }
        Ok(resolved)
    }
}

impl AssetSource for DirectorySource {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>>> {
        let resolved = self.resolve(url);
        let url = url.to_string();
        Box::pin(async move {
            let path = resolved?;
            read_file(&path)
                .await
                .map_err(|e| AssetError::Fetch(format!("{url} ({}): {e}", path.display())))
        })
    }
}

/// Read a file without blocking a Tokio worker when one is driving the future
async fn read_file(path: &Path) -> std::io::Result<Vec<u8>> {
    #[cfg(feature = "runtime-tokio")]
    if tokio::runtime::Handle::try_current().is_ok() {
        return tokio::fs::read(path).await;
    }
    std::fs::read(path)
}

/// Serves bytes registered up front, such as assets bundled into a binary
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: Arc<RwLock<HashMap<String, Arc<Vec<u8>>>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        self.files.write().insert(url.into(), Arc::new(bytes));
    }

    pub fn remove(&self, url: &str) -> bool {
        self.files.write().remove(url).is_some()
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>>> {
        let found = self.files.read().get(url).cloned();
        let url = url.to_string();
        Box::pin(async move {
            found
                .map(|bytes| bytes.as_ref().clone())
                .ok_or_else(|| AssetError::Fetch(format!("{url} not found")))
        })
    }
}
