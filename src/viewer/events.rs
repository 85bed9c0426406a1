//! Callbacks a viewer session fires toward the presentation shell

use crate::error::AssetError;

/// Notified when a session enters `Ready` or `Error`
pub trait ViewerEvents: Send {
    fn on_load(&mut self, _url: &str) {}

    fn on_error(&mut self, _url: &str, _error: &AssetError) {}
}

/// Ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEvents;

impl ViewerEvents for NoopEvents {}
