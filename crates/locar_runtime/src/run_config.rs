//! Run Configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. First positional argument: path to a scene config JSON file
//! 2. Environment variables: `LOCAR_CONFIG`, `LOCAR_CATALOG`, `LOCAR_FRAMES`,
//!    `LOCAR_HEADING`
//! 3. Built-in defaults: sample catalog, default scene config
//!
//! # Example Scene Config
//!
//! ```json
//! {
//!   "projection": "great_circle",
//!   "anchor_height_m": 1.5,
//!   "refresh_interval_frames": 300
//! }
//! ```

use locar_math::GeoCoord;
use locar_scene::{parse_catalog, sample_markers, GeoMarker, SceneConfig};
use std::error::Error;
use std::path::Path;

/// Everything the walk-through needs
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub scene: SceneConfig,
    pub markers: Vec<GeoMarker>,
    /// Device start location
    pub start: GeoCoord,
    /// Compass heading of the scene's forward axis
    pub heading_deg: f64,
    /// Frames to simulate
    pub frames: u32,
    /// Metres walked per frame
    pub step_m: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            scene: SceneConfig::default(),
            markers: sample_markers(),
            // Times City gate, a short walk from every sample marker
            start: GeoCoord::new(20.9955, 105.8690),
            heading_deg: 0.0,
            frames: 240,
            step_m: 0.5,
        }
    }
}

impl RunConfig {
    /// Load from arguments and environment on top of the defaults
    pub fn load() -> Result<Self, Box<dyn Error>> {
        let mut config = Self::default();

        let config_path = std::env::args()
            .skip(1)
            .find(|arg| !arg.starts_with("--"))
            .or_else(|| std::env::var("LOCAR_CONFIG").ok());
        if let Some(path) = config_path {
            config.scene = SceneConfig::from_json(&read(&path)?)?;
            log::info!("Loaded scene config from {}", path);
        }

        if let Ok(path) = std::env::var("LOCAR_CATALOG") {
            config.markers = parse_catalog(&read(&path)?)?;
            log::info!("Loaded {} markers from {}", config.markers.len(), path);
        }

        if let Ok(frames) = std::env::var("LOCAR_FRAMES") {
            match frames.parse() {
                Ok(n) => config.frames = n,
                Err(_) => log::warn!("Ignoring LOCAR_FRAMES={}", frames),
            }
        }

        if let Ok(heading) = std::env::var("LOCAR_HEADING") {
            match heading.parse() {
                Ok(h) => config.heading_deg = h,
                Err(_) => log::warn!("Ignoring LOCAR_HEADING={}", heading),
            }
        }

        Ok(config)
    }

    pub fn print_summary(&self) {
        log::info!("Run configuration:");
        log::info!("  Projection: {:?}", self.scene.projection);
        log::info!("  Anchor height: {} m", self.scene.anchor_height_m);
        log::info!("  Refresh interval: {:?}", self.scene.refresh_interval_frames);
        log::info!("  Markers: {}", self.markers.len());
        log::info!(
            "  Start: ({:.6}, {:.6}) heading {}°",
            self.start.latitude,
            self.start.longitude,
            self.heading_deg
        );
        log::info!("  Frames: {} ({} m/frame)", self.frames, self.step_m);
    }
}

fn read(path: &str) -> Result<String, Box<dyn Error>> {
    if !Path::new(path).exists() {
        return Err(format!("config file not found: {}", path).into());
    }
    Ok(std::fs::read_to_string(path)?)
}
