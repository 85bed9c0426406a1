//! Error types for showcase_viewer

use thiserror::Error;

use crate::gpu::GpuError;

/// Main error type for asset operations
///
/// Every variant carries owned strings so an error can be stored in a cache
/// entry and handed to callbacks at the same time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("Failed to fetch asset: {0}")]
    Fetch(String),

    #[error("Failed to parse asset: {0}")]
    Parse(String),

    #[error("Failed to process asset: {0}")]
    Processing(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
}

/// Coarse classification used by the viewer and by logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The asset could not be retrieved
    Fetch,
    /// The asset was retrieved but no scene could be built from it
    Parse,
    /// Normalization or GPU upload of a parsed scene failed
    Processing,
}

impl AssetError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch(_) => ErrorKind::Fetch,
            Self::Parse(_) | Self::UnsupportedFormat(_) => ErrorKind::Parse,
            Self::Processing(_) | Self::Gpu(_) => ErrorKind::Processing,
        }
    }
}

impl From<std::io::Error> for AssetError {
    fn from(err: std::io::Error) -> Self {
        Self::Fetch(err.to_string())
    }
}

impl From<gltf::Error> for AssetError {
    fn from(err: gltf::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type alias for asset operations
pub type Result<T> = std::result::Result<T, AssetError>;
