//! Configuration file layer

use std::path::Path;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{PicslimError, Result};

/// A partial configuration, as read from a file or built from overrides
///
/// Every field is optional; `None` means "keep the lower layer's value".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigLayer {
    pub input_dir: Option<String>,
    pub output_dir: Option<String>,
    pub quality: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub compression_level: Option<u32>,
    pub formats: Option<Vec<String>>,
    pub recursive: Option<bool>,
    pub concurrency: Option<usize>,
}

impl ConfigLayer {
    /// Load a configuration layer from file
    ///
    /// `.toml` and `.yaml`/`.yml` are parsed by extension, anything else as JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "toml" => toml::from_str(&content).map_err(Into::into),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(Into::into),
            _ => serde_json::from_str(&content).map_err(Into::into),
        }
    }
}

/// Load a layer, substituting an empty layer on any failure
///
/// A missing file is only worth a warning when the path was given explicitly.
pub(crate) fn load_layer_or_fallback(path: &Path, explicit: bool) -> ConfigLayer {
    match ConfigLayer::from_file(path) {
        Ok(layer) => {
            debug!("Loaded configuration from {:?}", path);
            layer
        }
        Err(PicslimError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
            debug!("No configuration file at {:?}, using defaults", path);
            ConfigLayer::default()
        }
        Err(e) => {
            warn!("Ignoring configuration file {:?}, using built-in defaults for all fields: {}", path, e);
            ConfigLayer::default()
        }
    }
}
