//! Integration tests for GPU abstraction layer

use glam::Vec3;
use showcase_viewer::{GpuDevice, GpuError, MockGpu, Scene, SceneMesh};

#[test]
fn test_mock_gpu_integration() {
    let gpu = MockGpu::new();
    let scene = Scene::cuboid(Vec3::ZERO, Vec3::ONE);

    let geometry = gpu.create_geometry(&scene.meshes[0]).unwrap();
    let material = gpu.create_material(&scene.materials[0]).unwrap();
    assert_eq!(gpu.live_handles(), 2);
    assert!(gpu.allocated_bytes() > 0);

    gpu.dispose_geometry(geometry);
    gpu.dispose_material(material);
    assert_eq!(gpu.live_handles(), 0);
    assert_eq!(gpu.allocated_bytes(), 0);
}

#[test]
fn test_empty_mesh_rejected() {
    let gpu = MockGpu::new();
    let mesh = SceneMesh::triangles(Vec::new(), Vec::new());

    assert!(matches!(
        gpu.create_geometry(&mesh),
        Err(GpuError::InvalidSize(0))
    ));
    assert_eq!(gpu.live_geometries(), 0);
}

#[test]
fn test_clones_share_counters() {
    let gpu = MockGpu::new();
    let other = gpu.clone();
    let scene = Scene::cuboid(Vec3::ZERO, Vec3::ONE);

    let geometry = gpu.create_geometry(&scene.meshes[0]).unwrap();
    assert_eq!(other.live_geometries(), 1);
    other.dispose_geometry(geometry);
    assert_eq!(gpu.live_geometries(), 0);
}

#[test]
fn test_gpu_trait_bound() {
    fn upload_all<G: GpuDevice>(gpu: &G, scene: &Scene) -> Vec<G::Geometry> {
        scene
            .meshes
            .iter()
            .filter_map(|mesh| gpu.create_geometry(mesh).ok())
            .collect()
    }

    let gpu = MockGpu::new();
    let geometries = upload_all(&gpu, &Scene::cuboid(Vec3::ZERO, Vec3::ONE));
    assert_eq!(geometries.len(), 1);
    assert_eq!(gpu.backend_name(), "Mock");
}
