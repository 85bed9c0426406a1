//! Portfolio example: preload every project model, then open two of them
//! in a viewer the way a gallery does when the user clicks quickly.

use glam::Vec3;
use showcase_viewer::{
    AssetCache, AssetError, MockEngine, MockGpu, PreloadCoordinator, ProjectRecord, Scene,
    TokioSpawner, Transition, ViewerConfig, ViewerEvents, ViewerSession,
};
use std::sync::Arc;

const PROJECTS: &str = r#"[
    { "title": "Delivery drone", "category": "Robotics", "modelUrl": "/models/drone.glb", "hasModel": true },
    { "title": "Lab website", "category": "Web" },
    { "title": "Mars rover", "category": "Robotics", "modelUrl": "/models/rover.glb", "hasModel": true },
    { "title": "Old prototype", "modelUrl": "/models/prototype.fbx", "hasModel": true }
]"#;

struct PrintEvents;

impl ViewerEvents for PrintEvents {
    fn on_load(&mut self, url: &str) {
        println!("  on_load: {url}");
    }

    fn on_error(&mut self, url: &str, error: &AssetError) {
        println!("  on_error: {url}: {error}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let projects = ProjectRecord::list_from_json(PROJECTS)?;

    let engine = Arc::new(MockEngine::new());
    engine.insert_scene(
        "/models/drone.glb",
        Scene::cuboid(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.5, 1.0)),
    );
    engine.insert_scene(
        "/models/rover.glb",
        Scene::cuboid(Vec3::ZERO, Vec3::new(30.0, 12.0, 20.0)),
    );
    engine.fail_sync(
        "/models/prototype.fbx",
        AssetError::UnsupportedFormat("no loader for .fbx models".to_string()),
    );

    let cache = AssetCache::default();
    let sweeper = cache.spawn_sweeper();
    let coordinator = PreloadCoordinator::new(engine, cache.clone(), TokioSpawner::new());

    println!("showcase_viewer v{}", showcase_viewer::VERSION);
    let issued = coordinator.preload_projects_if_changed(&projects).unwrap_or(0);
    println!("Issued {issued} preload requests");
    tokio::task::yield_now().await;

    let gpu = MockGpu::new();
    let mut session = ViewerSession::new(coordinator.clone(), gpu.clone(), ViewerConfig::default())
        .with_events(PrintEvents);

    // The user clicks the drone, then the rover before the drone finishes
    let drone = session.open("/models/drone.glb");
    let rover = session.open("/models/rover.glb");
    if let (Some(drone), Some(rover)) = (drone, rover) {
        let drone = session.load_future(&drone);
        let rover = session.load_future(&rover);
        let (drone, rover) = futures::join!(drone, rover);
        for outcome in [rover, drone] {
            let url = outcome.request.url().to_string();
            match session.complete(outcome) {
                Transition::Discarded => println!("Discarded stale result for {url}"),
                transition => println!("{url}: {transition:?}"),
            }
        }
    }

    if let Some(normalization) = session.normalization() {
        println!(
            "Showing {:?} scaled by {:.3} ({} GPU handles)",
            session.current_url(),
            normalization.scale,
            gpu.live_handles()
        );
    }

    if let Some(request) = session.open("/models/prototype.fbx") {
        session.load(request).await;
        println!("View: {:?}", session.view());
    }

    session.unmount();
    sweeper.abort();
    println!(
        "Cache holds {} entries, {} GPU handles left",
        cache.len(),
        gpu.live_handles()
    );
    Ok(())
}
