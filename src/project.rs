//! Project records supplied by the presentation shell
//!
//! The shell owns titles, categories and everything else about a project; this
//! crate only reads whether a record declares a model and where it lives.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// File extensions the portfolio accepts for 3D models
pub const SUPPORTED_MODEL_EXTENSIONS: &[&str] = &["gltf", "glb", "obj", "fbx", "dae", "3ds"];

/// 3D model file format, detected from a URL's extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    /// glTF JSON
    Gltf,
    /// Binary glTF
    Glb,
    Obj,
    Fbx,
    /// COLLADA
    Dae,
    /// Autodesk 3DS
    ThreeDs,
}

impl ModelFormat {
    /// Detect the format of a model URL, ignoring any query string or fragment
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "gltf" => Some(Self::Gltf),
            "glb" => Some(Self::Glb),
            "obj" => Some(Self::Obj),
            "fbx" => Some(Self::Fbx),
            "dae" => Some(Self::Dae),
            "3ds" => Some(Self::ThreeDs),
            _ => None,
        }
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gltf => "gltf",
            Self::Glb => "glb",
            Self::Obj => "obj",
            Self::Fbx => "fbx",
            Self::Dae => "dae",
            Self::ThreeDs => "3ds",
        }
    }

    /// Whether this format belongs to the glTF family
    pub fn is_gltf(&self) -> bool {
        matches!(self, Self::Gltf | Self::Glb)
    }
}

/// A portfolio project as seen by the preloader and viewer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectRecord {
    pub title: String,
    pub category: Option<String>,
    pub model_url: Option<String>,
    pub has_model: bool,
}

impl ProjectRecord {
    /// Create a record without a model
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Attach a model URL and mark the record as having a model
    pub fn with_model(mut self, url: impl Into<String>) -> Self {
        self.model_url = Some(url.into());
        self.has_model = true;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// The model URL, if the record declares a model and the URL is non-empty
    pub fn model_url(&self) -> Option<&str> {
        if !self.has_model {
            return None;
        }
        self.model_url.as_deref().filter(|url| !url.is_empty())
    }

    /// Parse the shell's JSON project list
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(ModelFormat::from_url("/models/bike.glb"), Some(ModelFormat::Glb));
        assert_eq!(
            ModelFormat::from_url("/models/Plant.GLTF?v=2"),
            Some(ModelFormat::Gltf)
        );
        assert_eq!(ModelFormat::from_url("/models/part.3ds"), Some(ModelFormat::ThreeDs));
        assert_eq!(ModelFormat::from_url("/models/readme.txt"), None);
        assert_eq!(ModelFormat::from_url("/models/noext"), None);
    }

    #[test]
    fn test_extensions_cover_formats() {
        for ext in SUPPORTED_MODEL_EXTENSIONS {
            let url = format!("/models/a.{ext}");
            let format = ModelFormat::from_url(&url).unwrap();
            assert_eq!(format.extension(), *ext);
        }
    }

    #[test]
    fn test_model_url_requires_flag() {
        let mut record = ProjectRecord::new("Drone").with_model("/models/drone.glb");
        assert_eq!(record.model_url(), Some("/models/drone.glb"));

        record.has_model = false;
        assert_eq!(record.model_url(), None);

        let empty = ProjectRecord::new("Empty").with_model("");
        assert_eq!(empty.model_url(), None);
    }
}
