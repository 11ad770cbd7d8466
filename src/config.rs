//! Startup configuration.
//!
//! Read once from an optional JSON file and handed to [`crate::app::App`].
//! Every field has a default, so `{}` is a valid file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::raster::THUMBNAIL_SCALE;
use crate::tool::ToolId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Tool shown when the navigation value is missing or unknown.
    pub default_tool: ToolId,
    /// Render scale of the Draw and Edit canvases.
    pub edit_scale: f64,
    /// Render scale of exported page images.
    pub export_scale: f64,
    pub thumbnail_scale: f64,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
    pub navigation_throttle_ms: u64,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_tool: ToolId::Draw,
            edit_scale: 1.5,
            export_scale: 2.0,
            thumbnail_scale: THUMBNAIL_SCALE,
            jpeg_quality: 95,
            navigation_throttle_ms: 1000,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("edit_scale", self.edit_scale),
            ("export_scale", self.export_scale),
            ("thumbnail_scale", self.thumbnail_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config(format!("{name} must be positive, got {value}")));
            }
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::Config(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    pub fn navigation_throttle(&self) -> Duration {
        Duration::from_millis(self.navigation_throttle_ms)
    }
}
