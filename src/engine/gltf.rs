//! GLTF/GLB engine
//!
//! Parses binary glTF and glTF JSON into a [`Scene`], baking node transforms
//! into mesh positions. Buffers come from the GLB binary chunk, from base64
//! `data:` URIs, or from files next to the model fetched through the same
//! [`AssetSource`].
//!
//! Each URL has one shared parse future, so a warm and a load issued back to
//! back fetch the file once. Parsed scenes stay memoized until evicted; hosts
//! that sweep the [`AssetCache`] should follow with
//! [`GltfEngine::evict_uncached`] to bound memory.

use ::gltf::buffer::Source;
use ::gltf::Gltf;
use base64::Engine;
use futures::future::{FutureExt, Shared};
use glam::{Mat4, Vec3};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::{AssetEngine, AssetSource, DirectorySource, LoadFuture, WarmFuture};
use crate::cache::AssetCache;
use crate::error::{AssetError, Result};
use crate::project::ModelFormat;
use crate::runtime::BoxFuture;
use crate::scene::{Material, PrimitiveType, Scene, SceneMesh};

type SceneFuture = Shared<BoxFuture<'static, Result<Arc<Scene>>>>;

/// Asset engine backed by the `gltf` crate
pub struct GltfEngine<S: AssetSource = DirectorySource> {
    source: Arc<S>,
    scenes: Arc<Mutex<HashMap<String, SceneFuture>>>,
}

impl<S: AssetSource> GltfEngine<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            scenes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Whether a parsed scene is memoized for `url`
    pub fn is_parsed(&self, url: &str) -> bool {
        self.scenes
            .lock()
            .get(url)
            .is_some_and(|scene| matches!(scene.peek(), Some(Ok(_))))
    }

    /// Number of URLs with a parsed or pending scene
    pub fn memo_len(&self) -> usize {
        self.scenes.lock().len()
    }

    /// Drop the memoized scene for `url`
    pub fn evict(&self, url: &str) -> bool {
        self.scenes.lock().remove(url).is_some()
    }

    /// Drop failed parses and parsed scenes whose URL has no entry in `cache`.
    /// Pending parses are kept. Returns how many were dropped.
    pub fn evict_uncached(&self, cache: &AssetCache) -> usize {
        let mut scenes = self.scenes.lock();
        let before = scenes.len();
        scenes.retain(|url, scene| match scene.peek() {
            None => true,
            Some(Ok(_)) => cache.contains(url),
            Some(Err(_)) => false,
        });
        let evicted = before - scenes.len();
        if evicted > 0 {
            log::debug!("Evicted {evicted} memoized glTF scenes");
        }
        evicted
    }

    fn check_format(url: &str) -> Result<()> {
        match ModelFormat::from_url(url) {
            Some(format) if format.is_gltf() => Ok(()),
            Some(format) => Err(AssetError::UnsupportedFormat(format!(
                "no loader for .{} models ({url})",
                format.extension()
            ))),
            None => Err(AssetError::UnsupportedFormat(format!(
                "{url} has no recognized model extension"
            ))),
        }
    }

    /// The shared parse for `url`, started lazily on first poll. A failed
    /// parse is replaced so the next request fetches again.
    fn scene_future(&self, url: &str) -> SceneFuture {
        let mut scenes = self.scenes.lock();
        if let Some(scene) = scenes.get(url) {
            if !matches!(scene.peek(), Some(Err(_))) {
                log::debug!("Sharing glTF parse for {url}");
                return scene.clone();
            }
        }

        let source = Arc::clone(&self.source);
        let owned_url = url.to_string();
        let parse: BoxFuture<'static, Result<Arc<Scene>>> =
            Box::pin(async move { load_scene(&*source, &owned_url).await.map(Arc::new) });
        let shared = parse.shared();
        scenes.insert(url.to_string(), shared.clone());
        shared
    }
}

impl<S: AssetSource> AssetEngine for GltfEngine<S> {
    fn warm(&self, url: &str) -> Result<WarmFuture> {
        Self::check_format(url)?;
        let scene = self.scene_future(url);
        Ok(Box::pin(async move { scene.await.map(|_| ()) }))
    }

    fn begin_load(&self, url: &str) -> Result<LoadFuture> {
        Self::check_format(url)?;
        let scene = self.scene_future(url);
        Ok(Box::pin(async move { scene.await.map(|s| Scene::clone(&s)) }))
    }

    fn engine_name(&self) -> &'static str {
        "glTF"
    }
}

/// Where one glTF buffer's bytes live
enum BufferLocation {
    Blob,
    Embedded(Vec<u8>),
    External(String),
}

/// Fetch `url`, then any external buffers it references, and build the scene
async fn load_scene<S: AssetSource>(source: &S, url: &str) -> Result<Scene> {
    let bytes = source.fetch(url).await?;
    let gltf = Gltf::from_slice(&bytes)?;

    let locations = gltf
        .buffers()
        .map(|buffer| match buffer.source() {
            Source::Bin => Ok(BufferLocation::Blob),
            Source::Uri(uri) if uri.starts_with("data:") => {
                decode_data_uri(uri).map(BufferLocation::Embedded)
            }
            Source::Uri(uri) => resolve_relative(url, uri).map(BufferLocation::External),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut buffers = Vec::with_capacity(locations.len());
    for location in locations {
        let data = match location {
            BufferLocation::Blob => blob(&gltf)?.to_vec(),
            BufferLocation::Embedded(data) => data,
            BufferLocation::External(buffer_url) => {
                log::debug!("Fetching glTF buffer {buffer_url}");
                source.fetch(&buffer_url).await?
            }
        };
        buffers.push(data);
    }

    build_scene(&gltf, &buffers)
}

/// Parse self-contained GLB/glTF bytes into a scene.
///
/// Buffers must live in the GLB binary chunk or in `data:` URIs; external
/// buffer files need [`GltfEngine`] and an [`AssetSource`].
pub fn parse_gltf(data: &[u8]) -> Result<Scene> {
    let gltf = Gltf::from_slice(data)?;
    let buffers = gltf
        .buffers()
        .map(|buffer| match buffer.source() {
            Source::Bin => blob(&gltf).map(<[u8]>::to_vec),
            Source::Uri(uri) if uri.starts_with("data:") => decode_data_uri(uri),
            Source::Uri(uri) => Err(AssetError::Parse(format!(
                "external buffer {uri} needs an asset source"
            ))),
        })
        .collect::<Result<Vec<_>>>()?;
    build_scene(&gltf, &buffers)
}

fn blob(gltf: &Gltf) -> Result<&[u8]> {
    gltf.blob
        .as_deref()
        .ok_or_else(|| AssetError::Parse("binary chunk referenced but missing".to_string()))
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| AssetError::Parse("malformed data URI".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(AssetError::Parse(format!(
            "unsupported data URI encoding {header}"
        )));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| AssetError::Parse(format!("invalid base64 buffer: {e}")))
}

/// Resolve a buffer URI against the model URL's directory
fn resolve_relative(model_url: &str, uri: &str) -> Result<String> {
    if uri.contains("://") || uri.starts_with('/') {
        return Ok(uri.to_string());
    }

    let model_path = model_url.split(['?', '#']).next().unwrap_or(model_url);
    let mut segments: Vec<&str> = model_path.split('/').collect();
    // Drop the model file name
    segments.pop();

    for part in uri.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if matches!(segments.as_slice(), [] | [""]) {
                    return Err(AssetError::Fetch(format!(
                        "{uri} escapes the root of {model_url}"
                    )));
                }
                segments.pop();
            }
            part => segments.push(part),
        }
    }
    Ok(segments.join("/"))
}

fn build_scene(gltf: &Gltf, buffers: &[Vec<u8>]) -> Result<Scene> {
    let materials: Vec<Material> = gltf
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            Material {
                name: material.name().map(str::to_string),
                base_color: pbr.base_color_factor(),
                metallic: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
                double_sided: material.double_sided(),
            }
        })
        .collect();

    let mut meshes = Vec::new();
    match gltf.default_scene().or_else(|| gltf.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                collect_node(&node, Mat4::IDENTITY, buffers, &mut meshes)?;
            }
        }
        None => {
            for mesh in gltf.meshes() {
                append_mesh(&mesh, Mat4::IDENTITY, buffers, &mut meshes)?;
            }
        }
    }

    log::debug!(
        "Parsed glTF with {} meshes and {} materials",
        meshes.len(),
        materials.len()
    );

    Ok(Scene::new(meshes, materials))
}

fn collect_node(
    node: &::gltf::Node<'_>,
    parent: Mat4,
    buffers: &[Vec<u8>],
    meshes: &mut Vec<SceneMesh>,
) -> Result<()> {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        append_mesh(&mesh, world, buffers, meshes)?;
    }
    for child in node.children() {
        collect_node(&child, world, buffers, meshes)?;
    }
    Ok(())
}

fn append_mesh(
    mesh: &::gltf::Mesh<'_>,
    world: Mat4,
    buffers: &[Vec<u8>],
    meshes: &mut Vec<SceneMesh>,
) -> Result<()> {
    for (prim_idx, primitive) in mesh.primitives().enumerate() {
        let primitive_type = match primitive.mode() {
            ::gltf::mesh::Mode::Points => PrimitiveType::Points,
            ::gltf::mesh::Mode::Lines => PrimitiveType::Lines,
            ::gltf::mesh::Mode::LineLoop | ::gltf::mesh::Mode::LineStrip => {
                PrimitiveType::LineStrip
            }
            ::gltf::mesh::Mode::Triangles => PrimitiveType::Triangles,
            ::gltf::mesh::Mode::TriangleStrip => PrimitiveType::TriangleStrip,
            ::gltf::mesh::Mode::TriangleFan => PrimitiveType::TriangleFan,
        };

        let reader =
            primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

        let positions: Vec<Vec3> = reader
            .read_positions()
            .ok_or_else(|| {
                AssetError::Parse(format!(
                    "mesh {} primitive {prim_idx} has no readable positions",
                    mesh.index()
                ))
            })?
            .map(|p| world.transform_point3(Vec3::from(p)))
            .collect();

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        meshes.push(SceneMesh {
            name: mesh.name().map(str::to_string),
            primitive_type,
            positions,
            indices,
            material_index: primitive.material().index(),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::MemorySource;
    use futures::executor::block_on;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A GLB holding one triangle (0,0,0) (1,0,0) (0,1,0) under a node
    /// translated by +1 on x, with one material
    pub(crate) fn triangle_glb() -> Vec<u8> {
        let json = r#"{"asset":{"version":"2.0"},"scene":0,"scenes":[{"nodes":[0]}],"nodes":[{"mesh":0,"translation":[1.0,0.0,0.0]}],"meshes":[{"name":"tri","primitives":[{"attributes":{"POSITION":0},"material":0}]}],"materials":[{"name":"steel","pbrMetallicRoughness":{"baseColorFactor":[0.5,0.5,0.5,1.0],"metallicFactor":0.8}}],"buffers":[{"byteLength":36}],"bufferViews":[{"buffer":0,"byteOffset":0,"byteLength":36}],"accessors":[{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0.0,0.0,0.0],"max":[1.0,1.0,0.0]}]}"#;

        let mut json_chunk = json.as_bytes().to_vec();
        while json_chunk.len() % 4 != 0 {
            json_chunk.push(b' ');
        }
        let bin_chunk: Vec<u8> = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
            .iter()
            .flat_map(|f| f.to_le_bytes())
            .collect();

        let total = 12 + 8 + json_chunk.len() + 8 + bin_chunk.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json_chunk);
        glb.extend_from_slice(&(bin_chunk.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(&bin_chunk);
        glb
    }

    fn engine_with_triangle() -> GltfEngine<MemorySource> {
        let source = MemorySource::new();
        source.insert("/models/tri.glb", triangle_glb());
        GltfEngine::new(source)
    }

    #[test]
    fn test_parse_gltf_bakes_node_transform() {
        let scene = parse_gltf(&triangle_glb()).unwrap();
        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.meshes[0].material_index, Some(0));
        assert_eq!(scene.materials[0].name.as_deref(), Some("steel"));
        assert_eq!(scene.materials[0].metallic, 0.8);

        let bounds = scene.local_bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(2.0, 1.0, 0.0));
        // No index accessor: indices are generated sequentially
        assert_eq!(scene.meshes[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_gltf_empty() {
        let result = parse_gltf(&[]);
        assert!(matches!(result, Err(AssetError::Parse(_))));
    }

    #[test]
    fn test_begin_load_unsupported_format_fails_synchronously() {
        let engine = engine_with_triangle();
        let err = engine.begin_load("/models/part.fbx").err().unwrap();
        assert!(matches!(err, AssetError::UnsupportedFormat(_)));
        assert!(engine.warm("/models/readme").is_err());
    }

    #[test]
    fn test_warm_memoizes_scene() {
        let engine = engine_with_triangle();
        assert!(!engine.is_parsed("/models/tri.glb"));

        block_on(engine.warm("/models/tri.glb").unwrap()).unwrap();
        assert!(engine.is_parsed("/models/tri.glb"));

        // Served from the memo even after the source loses the file
        engine.source().remove("/models/tri.glb");
        let scene = block_on(engine.begin_load("/models/tri.glb").unwrap()).unwrap();
        assert_eq!(scene.meshes.len(), 1);

        assert!(engine.evict("/models/tri.glb"));
        let missing = block_on(engine.begin_load("/models/tri.glb").unwrap());
        assert!(matches!(missing, Err(AssetError::Fetch(_))));
    }

    #[test]
    fn test_loads_are_independent_copies() {
        let engine = engine_with_triangle();
        let mut first = block_on(engine.begin_load("/models/tri.glb").unwrap()).unwrap();
        let second = block_on(engine.begin_load("/models/tri.glb").unwrap()).unwrap();

        first.normalize(4.0).unwrap();
        assert_ne!(first.transform, second.transform);
    }

    #[derive(Default)]
    struct CountingSource {
        files: MemorySource,
        fetches: AtomicUsize,
    }

    impl AssetSource for CountingSource {
        fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.files.fetch(url)
        }
    }

    #[test]
    fn test_warm_and_load_share_one_fetch() {
        let source = CountingSource::default();
        source.files.insert("/models/tri.glb", triangle_glb());
        let engine = GltfEngine::new(source);

        let warm = engine.warm("/models/tri.glb").unwrap();
        let load = engine.begin_load("/models/tri.glb").unwrap();
        let scene = block_on(load).unwrap();
        block_on(warm).unwrap();

        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(engine.source().fetches.load(Ordering::SeqCst), 1);
        assert_eq!(engine.memo_len(), 1);
    }

    #[test]
    fn test_failed_parse_is_fetched_again() {
        let source = CountingSource::default();
        let engine = GltfEngine::new(source);

        let missing = block_on(engine.begin_load("/models/tri.glb").unwrap());
        assert!(matches!(missing, Err(AssetError::Fetch(_))));

        engine.source().files.insert("/models/tri.glb", triangle_glb());
        let scene = block_on(engine.begin_load("/models/tri.glb").unwrap()).unwrap();
        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(engine.source().fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_evict_uncached_follows_cache() {
        use crate::cache::AssetStatus;

        let engine = engine_with_triangle();
        engine.source().insert("/models/other.glb", triangle_glb());
        block_on(engine.warm("/models/tri.glb").unwrap()).unwrap();
        block_on(engine.warm("/models/other.glb").unwrap()).unwrap();
        let _ = block_on(engine.warm("/models/missing.glb").unwrap());
        // Not polled yet
        let _pending = engine.warm("/models/later.glb").unwrap();

        let cache = AssetCache::default();
        cache.record_status("/models/tri.glb", AssetStatus::Preloaded);

        assert_eq!(engine.evict_uncached(&cache), 2);
        assert!(engine.is_parsed("/models/tri.glb"));
        assert!(!engine.is_parsed("/models/other.glb"));
        assert_eq!(engine.memo_len(), 2);
    }

    #[test]
    fn test_decode_data_uri() {
        let bytes = decode_data_uri("data:application/octet-stream;base64,AQID").unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        let bytes = decode_data_uri("data:application/gltf-buffer;base64,AQID").unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);

        assert!(decode_data_uri("data:text/plain,hello").is_err());
        assert!(decode_data_uri("data:application/octet-stream;base64,@@").is_err());
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_relative("/models/tri.gltf", "tri.bin").unwrap(),
            "/models/tri.bin"
        );
        assert_eq!(
            resolve_relative("/models/car/car.gltf?v=2", "../shared/./wheels.bin").unwrap(),
            "/models/shared/wheels.bin"
        );
        assert_eq!(
            resolve_relative("/models/tri.gltf", "/buffers/tri.bin").unwrap(),
            "/buffers/tri.bin"
        );
        assert!(resolve_relative("/models/tri.gltf", "../../tri.bin").is_err());
    }
}
