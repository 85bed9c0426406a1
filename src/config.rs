//! Configuration for the asset cache and viewer sessions
//!
//! All settings have defaults matching the portfolio viewer, and every struct
//! deserializes from partial JSON so a host only has to spell out overrides.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache expiry settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Age after which an entry is removed by the sweep
    pub ttl: Duration,
    /// How often the periodic sweep runs
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    /// Set the entry time-to-live
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the sweep interval
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

/// Orbit camera controls shown when `show_controls` is enabled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrbitSettings {
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub enable_rotate: bool,
    /// Multiplier on the engine's default auto-rotate speed
    pub auto_rotate_speed: f32,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enable_pan: true,
            enable_zoom: true,
            enable_rotate: true,
            auto_rotate_speed: 1.0,
            damping_factor: 0.05,
            min_distance: 1.0,
            max_distance: 20.0,
        }
    }
}

/// Per-viewer configuration supplied by the presentation shell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerConfig {
    /// Viewport height in pixels
    pub height: u32,
    pub auto_rotate: bool,
    pub show_controls: bool,
    /// Initial camera position in normalized scene units
    pub camera_position: [f32; 3],
    /// Vertical field of view in degrees
    pub camera_fov: f32,
    /// Manual retries allowed after a failed load
    pub max_retries: u32,
    /// Edge length of the cube every normalized asset fits into
    pub target_extent: f32,
    pub orbit: OrbitSettings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            height: 256,
            auto_rotate: false,
            show_controls: true,
            camera_position: [0.0, 0.0, 5.0],
            camera_fov: 50.0,
            max_retries: 3,
            target_extent: 4.0,
            orbit: OrbitSettings::default(),
        }
    }
}

impl ViewerConfig {
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn with_auto_rotate(mut self, auto_rotate: bool) -> Self {
        self.auto_rotate = auto_rotate;
        self
    }

    pub fn with_controls(mut self, show_controls: bool) -> Self {
        self.show_controls = show_controls;
        self
    }

    pub fn with_camera_position(mut self, position: [f32; 3]) -> Self {
        self.camera_position = position;
        self
    }

    /// Parse a config from JSON, filling omitted fields with defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
