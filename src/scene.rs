//! Engine-neutral scene graph and normalization
//!
//! Loaders bake node transforms into mesh positions, so a [`Scene`] is a flat
//! list of meshes plus a single root transform that normalization writes to.

use glam::Vec3;

use crate::error::{AssetError, Result};

/// Type of primitive to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Material factors needed to create a GPU material
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    /// Base color factor (RGBA)
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 1.0,
            roughness: 1.0,
            double_sided: false,
        }
    }
}

/// A mesh with positions already in scene space
#[derive(Debug, Clone, PartialEq)]
pub struct SceneMesh {
    pub name: Option<String>,
    pub primitive_type: PrimitiveType,
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
    /// Index into [`Scene::materials`]
    pub material_index: Option<usize>,
}

impl SceneMesh {
    /// Create a triangle mesh
    pub fn triangles(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            name: None,
            primitive_type: PrimitiveType::Triangles,
            positions,
            indices,
            material_index: None,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Bytes a GPU buffer needs for positions and indices
    pub fn byte_size(&self) -> usize {
        self.positions.len() * std::mem::size_of::<[f32; 3]>()
            + self.indices.len() * std::mem::size_of::<u32>()
    }

    /// Bounds of this mesh in scene space, `None` without vertices
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing all points, `None` for an empty iterator
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |aabb, p| Self {
            min: aabb.min.min(p),
            max: aabb.max.max(p),
        }))
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Uniform scale followed by translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl Transform {
    pub fn apply(&self, point: Vec3) -> Vec3 {
        point * self.scale + self.translation
    }

    /// Transform a box; valid because the scale is uniform and positive
    pub fn apply_aabb(&self, aabb: &Aabb) -> Aabb {
        Aabb::new(self.apply(aabb.min), self.apply(aabb.max))
    }
}

/// Result of fitting a scene into the viewing volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    /// Center of the source bounds before normalization
    pub center: Vec3,
    /// Size of the source bounds before normalization
    pub size: Vec3,
    /// Uniform scale factor applied
    pub scale: f32,
}

/// A loaded 3D scene
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub meshes: Vec<SceneMesh>,
    pub materials: Vec<Material>,
    /// Root transform applied on top of mesh positions
    pub transform: Transform,
}

impl Scene {
    pub fn new(meshes: Vec<SceneMesh>, materials: Vec<Material>) -> Self {
        Self {
            meshes,
            materials,
            transform: Transform::default(),
        }
    }

    /// A single box mesh spanning `min..max` with one default material
    pub fn cuboid(min: Vec3, max: Vec3) -> Self {
        let positions = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 == 0 { min.x } else { max.x },
                    if i & 2 == 0 { min.y } else { max.y },
                    if i & 4 == 0 { min.z } else { max.z },
                )
            })
            .collect();
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 1, 2, 3, // -z
            4, 5, 6, 5, 7, 6, // +z
            0, 1, 4, 1, 5, 4, // -y
            2, 6, 3, 3, 6, 7, // +y
            0, 4, 2, 2, 4, 6, // -x
            1, 3, 5, 3, 7, 5, // +x
        ];
        let mut mesh = SceneMesh::triangles(positions, indices);
        mesh.material_index = Some(0);
        Self::new(vec![mesh], vec![Material::default()])
    }

    /// Bounds of all meshes before the root transform
    pub fn local_bounds(&self) -> Option<Aabb> {
        self.meshes
            .iter()
            .filter_map(SceneMesh::bounds)
            .reduce(|a, b| a.union(&b))
    }

    /// Bounds of all meshes after the root transform
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.local_bounds()
            .map(|aabb| self.transform.apply_aabb(&aabb))
    }

    /// Center the scene on the origin and scale it uniformly so its largest
    /// dimension equals `target_extent`.
    ///
    /// Fails with [`AssetError::Processing`] when the scene has no vertices or
    /// its bounds are degenerate (zero or non-finite largest dimension).
    pub fn normalize(&mut self, target_extent: f32) -> Result<Normalization> {
        let bounds = self
            .local_bounds()
            .ok_or_else(|| AssetError::Processing("scene has no geometry".to_string()))?;

        let size = bounds.size();
        let max_dim = size.max_element();
        if !max_dim.is_finite() || max_dim <= 0.0 {
            return Err(AssetError::Processing(format!(
                "degenerate bounding box {size:?}"
            )));
        }

        let center = bounds.center();
        let scale = target_extent / max_dim;
        self.transform = Transform {
            translation: -center * scale,
            scale,
        };

        Ok(Normalization {
            center,
            size,
            scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert!(a.abs_diff_eq(b, 1e-5), "{a:?} != {b:?}");
    }

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points([Vec3::new(1.0, -2.0, 0.0), Vec3::new(-1.0, 3.0, 5.0)]).unwrap();
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 5.0));
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_cuboid_bounds() {
        let scene = Scene::cuboid(Vec3::new(-2.0, -1.0, -3.0), Vec3::new(2.0, 3.0, 1.0));
        let bounds = scene.local_bounds().unwrap();
        assert_vec_eq(bounds.size(), Vec3::splat(4.0));
        assert_vec_eq(bounds.center(), Vec3::new(0.0, 1.0, -1.0));
        assert_eq!(scene.meshes[0].index_count(), 36);
    }

    #[test]
    fn test_normalize_centers_and_scales() {
        let mut scene = Scene::cuboid(Vec3::new(-2.0, -1.0, -3.0), Vec3::new(2.0, 3.0, 1.0));
        let norm = scene.normalize(4.0).unwrap();
        assert_eq!(norm.scale, 1.0);
        assert_vec_eq(scene.world_bounds().unwrap().center(), Vec3::ZERO);
    }

    #[test]
    fn test_normalize_fits_largest_dimension() {
        let mut scene = Scene::cuboid(Vec3::new(10.0, 0.0, 0.0), Vec3::new(18.0, 4.0, 4.0));
        let norm = scene.normalize(4.0).unwrap();
        assert_eq!(norm.scale, 0.5);

        let world = scene.world_bounds().unwrap();
        assert_vec_eq(world.center(), Vec3::ZERO);
        assert_vec_eq(world.size(), Vec3::new(4.0, 2.0, 2.0));
    }

    #[test]
    fn test_normalize_empty_scene_fails() {
        let mut scene = Scene::default();
        let err = scene.normalize(4.0).unwrap_err();
        assert!(matches!(err, AssetError::Processing(_)));
    }

    #[test]
    fn test_normalize_single_point_fails() {
        let mesh = SceneMesh::triangles(vec![Vec3::ONE; 3], vec![0, 1, 2]);
        let mut scene = Scene::new(vec![mesh], Vec::new());
        assert!(scene.normalize(4.0).is_err());
        assert_eq!(scene.transform, Transform::default());
    }
}
