//! GPU abstraction layer for backend-agnostic resource ownership
//!
//! The rendering engine does not reclaim GPU buffers on its own, so every
//! handle created through [`GpuDevice`] must be handed back to the matching
//! `dispose_*` method exactly once.

pub mod mock;

use std::fmt::Debug;
use thiserror::Error;

use crate::scene::{Material, SceneMesh};

/// Error type for GPU operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GpuError {
    #[error("Buffer allocation failed: {0}")]
    AllocationFailed(String),

    #[error("Buffer upload failed: {0}")]
    UploadFailed(String),

    #[error("Material creation failed: {0}")]
    MaterialCreationFailed(String),

    #[error("Invalid buffer size: {0}")]
    InvalidSize(usize),

    #[error("Device lost")]
    DeviceLost,

    #[error("Out of memory")]
    OutOfMemory,
}

/// Result type for GPU operations
pub type GpuResult<T> = Result<T, GpuError>;

/// Core GPU device trait for backend-agnostic operations
///
/// # Associated Types
/// - `Geometry`: vertex/index buffers for one mesh
/// - `Material`: a compiled material for this backend
///
/// # Example
/// ```ignore
/// let gpu = MockGpu::new();
/// let geometry = gpu.create_geometry(&mesh)?;
/// gpu.dispose_geometry(geometry);
/// ```
pub trait GpuDevice: Send + Sync + Clone + Debug {
    /// Geometry handle type for this GPU backend
    type Geometry: Send + Sync + Debug;

    /// Material handle type for this GPU backend
    type Material: Send + Sync + Debug;

    /// Upload a mesh's positions and indices
    fn create_geometry(&self, mesh: &SceneMesh) -> GpuResult<Self::Geometry>;

    /// Create a material from its factors
    fn create_material(&self, material: &Material) -> GpuResult<Self::Material>;

    /// Release a geometry's buffers
    fn dispose_geometry(&self, geometry: Self::Geometry);

    /// Release a material
    fn dispose_material(&self, material: Self::Material);

    /// Get the name of this GPU backend (for debugging)
    fn backend_name(&self) -> &'static str;
}

// Re-export implementations
pub use mock::MockGpu;
