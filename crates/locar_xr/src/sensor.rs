//! Geographic sensors: GPS fix plus compass heading

use locar_math::GeoCoord;

/// A location fix aligned with the scene
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoFix {
    /// Device location
    pub coord: GeoCoord,
    /// Compass bearing of the scene's `-Z` axis, degrees clockwise from north
    pub heading_deg: f64,
    /// Horizontal accuracy radius in metres
    pub accuracy_m: f64,
}

impl GeoFix {
    pub fn new(coord: GeoCoord, heading_deg: f64) -> Self {
        Self {
            coord,
            heading_deg,
            accuracy_m: 0.0,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = accuracy_m;
        self
    }
}

/// Location and orientation updates backing an anchor scene
///
/// The scene forwards its own resume/pause here; nothing else starts or
/// stops the sensor.
pub trait GeoSensor: Send {
    /// Start (or restart) location and compass updates
    fn resume(&mut self);

    /// Stop updates, keeping the last fix
    fn pause(&mut self);

    /// Whether updates are currently flowing
    fn is_running(&self) -> bool;

    /// Most recent fix, if any arrived yet
    fn latest_fix(&self) -> Option<GeoFix>;
}
