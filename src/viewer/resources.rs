//! GPU handles owned by a viewer session

use crate::error::Result;
use crate::gpu::{GpuDevice, GpuResult};
use crate::scene::Scene;

/// A normalized scene together with the GPU handles created for it.
///
/// Dropping this without calling [`OwnedResources::release`] leaks GPU memory;
/// the session is the only owner and always releases explicitly.
#[derive(Debug)]
pub struct OwnedResources<G: GpuDevice> {
    url: String,
    scene: Scene,
    geometries: Vec<G::Geometry>,
    materials: Vec<G::Material>,
}

impl<G: GpuDevice> OwnedResources<G> {
    /// Create one geometry per mesh and one material per material.
    ///
    /// If any creation fails, the handles created so far are disposed before
    /// the error is returned.
    pub fn upload(gpu: &G, url: &str, scene: Scene) -> Result<Self> {
        let mut resources = Self {
            url: url.to_string(),
            geometries: Vec::with_capacity(scene.meshes.len()),
            materials: Vec::with_capacity(scene.materials.len()),
            scene,
        };

        if let Err(err) = resources.create_handles(gpu) {
            let released = resources.release(gpu);
            log::debug!("GPU upload of {url} failed, released {released} partial handles");
            return Err(err.into());
        }
        Ok(resources)
    }

    fn create_handles(&mut self, gpu: &G) -> GpuResult<()> {
        for mesh in &self.scene.meshes {
            self.geometries.push(gpu.create_geometry(mesh)?);
        }
        for material in &self.scene.materials {
            self.materials.push(gpu.create_material(material)?);
        }
        Ok(())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Number of live geometry and material handles
    pub fn handle_count(&self) -> usize {
        self.geometries.len() + self.materials.len()
    }

    /// Dispose every handle. Returns how many were disposed.
    pub fn release(self, gpu: &G) -> usize {
        let count = self.handle_count();
        for geometry in self.geometries {
            gpu.dispose_geometry(geometry);
        }
        for material in self.materials {
            gpu.dispose_material(material);
        }
        count
    }
}
