//! Mock GPU implementation for testing
//!
//! Tracks live handles and allocated bytes in memory so tests can assert that
//! every geometry and material was disposed.

use super::{GpuDevice, GpuError, GpuResult};
use crate::scene::{Material, SceneMesh};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counter for generating unique handle IDs
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Mock GPU device for testing
///
/// Clones share their counters, like handles to one physical device.
#[derive(Clone, Debug, Default)]
pub struct MockGpu {
    allocated_bytes: Arc<AtomicU64>,
    live_geometries: Arc<AtomicUsize>,
    live_materials: Arc<AtomicUsize>,
    /// Geometry creation fails with `OutOfMemory` once this many are live
    geometry_budget: Option<usize>,
}

impl MockGpu {
    /// Create a new mock GPU device
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device that runs out of memory after `budget` live geometries
    pub fn with_geometry_budget(budget: usize) -> Self {
        Self {
            geometry_budget: Some(budget),
            ..Self::default()
        }
    }

    /// Get total allocated memory (for testing)
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes.load(Ordering::Relaxed)
    }

    /// Number of geometries created and not yet disposed
    pub fn live_geometries(&self) -> usize {
        self.live_geometries.load(Ordering::Relaxed)
    }

    /// Number of materials created and not yet disposed
    pub fn live_materials(&self) -> usize {
        self.live_materials.load(Ordering::Relaxed)
    }

    /// All live handles
    pub fn live_handles(&self) -> usize {
        self.live_geometries() + self.live_materials()
    }
}

/// Mock geometry buffers
#[derive(Debug, PartialEq, Eq)]
pub struct MockGeometry {
    pub id: u64,
    pub size: usize,
    pub vertex_count: usize,
}

/// Mock material
#[derive(Debug, PartialEq)]
pub struct MockMaterial {
    pub id: u64,
    pub name: Option<String>,
    pub base_color: [f32; 4],
}

impl GpuDevice for MockGpu {
    type Geometry = MockGeometry;
    type Material = MockMaterial;

    fn create_geometry(&self, mesh: &SceneMesh) -> GpuResult<Self::Geometry> {
        let size = mesh.byte_size();
        if mesh.positions.is_empty() {
            return Err(GpuError::InvalidSize(size));
        }
        if let Some(budget) = self.geometry_budget {
            if self.live_geometries() >= budget {
                return Err(GpuError::OutOfMemory);
            }
        }

        self.allocated_bytes.fetch_add(size as u64, Ordering::Relaxed);
        self.live_geometries.fetch_add(1, Ordering::Relaxed);
        Ok(MockGeometry {
            id: next_id(),
            size,
            vertex_count: mesh.vertex_count(),
        })
    }

    fn create_material(&self, material: &Material) -> GpuResult<Self::Material> {
        self.live_materials.fetch_add(1, Ordering::Relaxed);
        Ok(MockMaterial {
            id: next_id(),
            name: material.name.clone(),
            base_color: material.base_color,
        })
    }

    fn dispose_geometry(&self, geometry: Self::Geometry) {
        self.allocated_bytes
            .fetch_sub(geometry.size as u64, Ordering::Relaxed);
        self.live_geometries.fetch_sub(1, Ordering::Relaxed);
    }

    fn dispose_material(&self, _material: Self::Material) {
        self.live_materials.fetch_sub(1, Ordering::Relaxed);
    }

    fn backend_name(&self) -> &'static str {
        "Mock"
    }
}
