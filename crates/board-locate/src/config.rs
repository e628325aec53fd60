//! JSON configuration for both strategies.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::contour::{ContourDetectorParams, MinArea};
use crate::template::TemplateDetectorParams;
use crate::DetectError;

/// Parameters of both detection strategies.
///
/// `contour.min_area` has no default and must be present in JSON; everything
/// else falls back to the documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocateConfig {
    pub contour: ContourDetectorParams,
    #[serde(default)]
    pub template: TemplateDetectorParams,
}

impl LocateConfig {
    pub fn new(min_area: MinArea) -> Self {
        Self {
            contour: ContourDetectorParams::new(min_area),
            template: TemplateDetectorParams::default(),
        }
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DetectError> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DetectError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DetectError> {
        self.contour.validate()?;
        self.template.validate()?;
        Ok(())
    }
}
