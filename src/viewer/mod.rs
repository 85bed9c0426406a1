//! Per-viewer load state machine
//!
//! A [`ViewerSession`] shows at most one asset. Opening a URL returns a
//! [`LoadRequest`]; the host runs [`ViewerSession::load_future`] on its event
//! loop and feeds the [`LoadOutcome`] back through
//! [`ViewerSession::complete`]. Outcomes from superseded requests are
//! discarded, so the most recent request always wins.
//!
//! ```ignore
//! if let Some(request) = session.open("/models/drone.glb") {
//!     let outcome = session.load_future(&request).await;
//!     session.complete(outcome);
//! }
//! ```

pub mod events;
pub mod resources;

use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

use crate::config::ViewerConfig;
use crate::engine::AssetEngine;
use crate::error::{AssetError, Result};
use crate::gpu::GpuDevice;
use crate::preload::PreloadCoordinator;
use crate::progress::ProgressEstimator;
use crate::runtime::{AsyncSpawner, BoxFuture};
use crate::scene::{Normalization, Scene};

pub use events::{NoopEvents, ViewerEvents};
pub use resources::OwnedResources;

/// Headline shown with a failed load
pub const ERROR_HEADLINE: &str = "Model not available";

/// Placeholder text when a project has no model
pub const UNAVAILABLE_MESSAGE: &str = "3D model not available";

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerState {
    /// No asset requested
    Idle,
    /// A load is in flight
    Loading,
    /// The asset is displayed and its GPU handles are owned
    Ready,
    /// The last load failed; no GPU handles are owned
    Error,
}

/// What the presentation shell should render
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerView {
    /// No model URL: neutral placeholder, distinct from a failure
    Unavailable,
    Loading {
        progress: f32,
    },
    Ready,
    Failed {
        message: String,
        retry_count: u32,
        can_retry: bool,
    },
}

/// A load the host must run and report back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    session: Uuid,
    generation: u64,
    url: String,
}

impl LoadRequest {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of running a [`LoadRequest`]
#[derive(Debug)]
pub struct LoadOutcome {
    pub request: LoadRequest,
    pub result: Result<Scene>,
}

/// Effect of [`ViewerSession::complete`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Ready,
    Failed,
    /// The outcome belonged to a superseded request and changed nothing
    Discarded,
}

/// Why a retry was refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryRejected {
    #[error("Retry is only available after a failed load")]
    NotFailed,

    #[error("Retry limit reached after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

/// One mounted viewer
pub struct ViewerSession<E: AssetEngine, G: GpuDevice, S: AsyncSpawner> {
    id: Uuid,
    coordinator: PreloadCoordinator<E, S>,
    gpu: G,
    config: ViewerConfig,
    events: Box<dyn ViewerEvents>,
    state: ViewerState,
    current_url: Option<String>,
    retry_count: u32,
    generation: u64,
    resources: Option<OwnedResources<G>>,
    last_error: Option<AssetError>,
    normalization: Option<Normalization>,
    progress: ProgressEstimator,
    load_started: Option<Instant>,
}

impl<E: AssetEngine, G: GpuDevice, S: AsyncSpawner> ViewerSession<E, G, S> {
    /// Mount a viewer in the `Idle` state
    pub fn new(coordinator: PreloadCoordinator<E, S>, gpu: G, config: ViewerConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            coordinator,
            gpu,
            config,
            events: Box::new(NoopEvents),
            state: ViewerState::Idle,
            current_url: None,
            retry_count: 0,
            generation: 0,
            resources: None,
            last_error: None,
            normalization: None,
            progress: ProgressEstimator::new(),
            load_started: None,
        }
    }

    /// Install the shell's `on_load` / `on_error` callbacks
    pub fn with_events(mut self, events: impl ViewerEvents + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Error from the last failed load, while in `Error`
    pub fn last_error(&self) -> Option<&AssetError> {
        self.last_error.as_ref()
    }

    /// The displayed scene, while in `Ready`
    pub fn scene(&self) -> Option<&Scene> {
        self.resources.as_ref().map(OwnedResources::scene)
    }

    /// How the displayed scene was fitted, while in `Ready`
    pub fn normalization(&self) -> Option<Normalization> {
        self.normalization
    }

    /// Live GPU handles owned by this session
    pub fn owned_resource_count(&self) -> usize {
        self.resources.as_ref().map_or(0, OwnedResources::handle_count)
    }

    /// Whether the shell should offer a retry action
    pub fn can_retry(&self) -> bool {
        self.state == ViewerState::Error && self.retry_count < self.config.max_retries
    }

    /// Open `url`; shorthand for `set_url(Some(url))`
    pub fn open(&mut self, url: &str) -> Option<LoadRequest> {
        self.set_url(Some(url))
    }

    /// Follow the asset path supplied by the shell.
    ///
    /// A missing or empty URL resets the session to `Idle` without touching
    /// the engine. Re-supplying the current URL is a no-op. Any other URL
    /// releases owned resources and starts a new load.
    pub fn set_url(&mut self, url: Option<&str>) -> Option<LoadRequest> {
        let Some(url) = url.filter(|url| !url.is_empty()) else {
            self.reset();
            return None;
        };
        if self.current_url.as_deref() == Some(url) && self.state != ViewerState::Idle {
            return None;
        }

        self.current_url = Some(url.to_string());
        self.retry_count = 0;
        Some(self.begin_load())
    }

    /// Reload the current URL after a failure.
    pub fn retry(&mut self) -> std::result::Result<LoadRequest, RetryRejected> {
        if self.state != ViewerState::Error {
            return Err(RetryRejected::NotFailed);
        }
        if self.retry_count >= self.config.max_retries {
            return Err(RetryRejected::Exhausted {
                attempts: self.retry_count,
            });
        }

        self.retry_count += 1;
        log::debug!(
            "Retrying {:?} ({}/{})",
            self.current_url,
            self.retry_count,
            self.config.max_retries
        );
        Ok(self.begin_load())
    }

    /// Run `request` against the engine.
    ///
    /// The future borrows nothing from the session, so the session can keep
    /// changing while it runs. A synchronous engine failure is reported
    /// through the outcome like an asynchronous one.
    pub fn load_future(&self, request: &LoadRequest) -> BoxFuture<'static, LoadOutcome> {
        let engine = std::sync::Arc::clone(self.coordinator.engine());
        let request = request.clone();
        Box::pin(async move {
            let result = match engine.begin_load(&request.url) {
                Ok(load) => load.await,
                Err(err) => Err(err),
            };
            LoadOutcome { request, result }
        })
    }

    /// Run `request` to completion and apply its outcome
    pub async fn load(&mut self, request: LoadRequest) -> Transition {
        let outcome = self.load_future(&request).await;
        self.complete(outcome)
    }

    /// Apply a finished load.
    ///
    /// Outcomes for another session, an older generation, a different URL,
    /// or arriving outside `Loading` are discarded without any state change.
    pub fn complete(&mut self, outcome: LoadOutcome) -> Transition {
        let LoadOutcome { request, result } = outcome;
        if !self.is_current(&request) {
            log::debug!(
                "Discarding stale load of {} (generation {})",
                request.url,
                request.generation
            );
            return Transition::Discarded;
        }

        let url = request.url;
        match result.and_then(|scene| self.adopt(&url, scene)) {
            Ok(()) => {
                self.state = ViewerState::Ready;
                self.retry_count = 0;
                self.last_error = None;
                self.progress.finish();
                if let Some(started) = self.load_started.take() {
                    self.coordinator
                        .cache()
                        .metrics()
                        .record_load(&url, started.elapsed());
                }
                self.coordinator.record_loaded(&url);
                log::info!("Viewer {} ready with {url}", self.id);
                self.events.on_load(&url);
                Transition::Ready
            }
            Err(err) => {
                log::warn!("Viewer {} failed to load {url}: {err}", self.id);
                self.state = ViewerState::Error;
                self.progress.reset();
                self.load_started = None;
                self.coordinator.record_failed(&url, err.clone());
                self.events.on_error(&url, &err);
                self.last_error = Some(err);
                Transition::Failed
            }
        }
    }

    /// Advance the cosmetic progress ramp while loading
    pub fn tick_progress(&mut self) -> f32 {
        if self.state == ViewerState::Loading {
            self.progress.advance()
        } else {
            self.progress.progress()
        }
    }

    /// Render state for the presentation shell
    pub fn view(&self) -> ViewerView {
        match self.state {
            ViewerState::Idle => ViewerView::Unavailable,
            ViewerState::Loading => ViewerView::Loading {
                progress: self.progress.progress(),
            },
            ViewerState::Ready => ViewerView::Ready,
            ViewerState::Error => ViewerView::Failed {
                message: self
                    .last_error
                    .as_ref()
                    .map_or_else(|| ERROR_HEADLINE.to_string(), ToString::to_string),
                retry_count: self.retry_count,
                can_retry: self.can_retry(),
            },
        }
    }

    /// Tear the viewer down, disposing every owned handle
    pub fn unmount(mut self) {
        let released = self.release_resources();
        log::debug!("Viewer {} unmounted, released {released} handles", self.id);
    }

    fn is_current(&self, request: &LoadRequest) -> bool {
        request.session == self.id
            && request.generation == self.generation
            && self.state == ViewerState::Loading
            && self.current_url.as_deref() == Some(request.url.as_str())
    }

    fn begin_load(&mut self) -> LoadRequest {
        self.release_resources();
        self.generation += 1;
        self.state = ViewerState::Loading;
        self.last_error = None;
        self.progress.start();
        self.load_started = Some(Instant::now());

        let url = self.current_url.clone().unwrap_or_default();
        self.coordinator.preload(&url);
        LoadRequest {
            session: self.id,
            generation: self.generation,
            url,
        }
    }

    fn adopt(&mut self, url: &str, mut scene: Scene) -> Result<()> {
        let normalization = scene.normalize(self.config.target_extent)?;
        let resources = OwnedResources::upload(&self.gpu, url, scene)?;
        self.normalization = Some(normalization);
        self.resources = Some(resources);
        Ok(())
    }

    fn reset(&mut self) {
        self.release_resources();
        self.generation += 1;
        self.state = ViewerState::Idle;
        self.current_url = None;
        self.retry_count = 0;
        self.last_error = None;
        self.progress.reset();
        self.load_started = None;
    }

    fn release_resources(&mut self) -> usize {
        self.normalization = None;
        match self.resources.take() {
            Some(resources) => {
                let url = resources.url().to_string();
                let released = resources.release(&self.gpu);
                log::debug!("Released {released} GPU handles for {url}");
                released
            }
            None => 0,
        }
    }
}

impl<E: AssetEngine, G: GpuDevice, S: AsyncSpawner> Drop for ViewerSession<E, G, S> {
    fn drop(&mut self) {
        self.release_resources();
    }
}

impl<E: AssetEngine, G: GpuDevice, S: AsyncSpawner> std::fmt::Debug for ViewerSession<E, G, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("current_url", &self.current_url)
            .field("retry_count", &self.retry_count)
            .field("generation", &self.generation)
            .field("owned_resources", &self.owned_resource_count())
            .finish()
    }
}
