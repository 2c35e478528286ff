//! Anchor scene configuration

use crate::error::{Result, SceneError};
use locar_math::Projection;
use serde::{Deserialize, Serialize};

/// Anchor scene configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// How geographic offsets are flattened into scene space
    pub projection: Projection,

    /// Height of anchors relative to the device, metres
    pub anchor_height_m: f64,

    /// Re-anchor every record against a fresh fix every N tracked frames.
    /// `None` keeps anchors where they were first placed.
    pub refresh_interval_frames: Option<u32>,

    /// Layout used for marker label views
    pub label_layout: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            projection: Projection::LocalTangentPlane,
            anchor_height_m: 0.0,
            refresh_interval_frames: None,
            label_layout: "example_layout".to_string(),
        }
    }
}

impl SceneConfig {
    /// For devices with noisy GPS: re-anchor every ~5s at 60fps
    pub fn drifting_gps() -> Self {
        Self {
            refresh_interval_frames: Some(300),
            ..Default::default()
        }
    }

    /// For markers spread over many kilometres
    pub fn long_range() -> Self {
        Self {
            projection: Projection::GreatCircle,
            ..Default::default()
        }
    }

    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.anchor_height_m.is_finite() {
            return Err(SceneError::Config(format!(
                "anchor_height_m must be finite, got {}",
                self.anchor_height_m
            )));
        }
        if self.refresh_interval_frames == Some(0) {
            return Err(SceneError::Config(
                "refresh_interval_frames must be at least 1".to_string(),
            ));
        }
        if self.label_layout.trim().is_empty() {
            return Err(SceneError::Config("label_layout must not be empty".to_string()));
        }
        Ok(())
    }
}
