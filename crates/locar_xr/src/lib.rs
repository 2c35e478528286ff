//! # locar_xr - AR Collaborator Abstraction
//!
//! Everything the anchor engine consumes from the outside world, expressed
//! as narrow traits:
//! - [`TrackingProvider`]: per-frame camera pose, tracking state, planes
//! - [`AnchorStore`]: native anchor allocation ([`Anchor`] is the owning RAII handle)
//! - [`ArSession`] / [`SessionProvider`]: session bootstrap and lifecycle
//! - [`GeoSensor`]: GPS fix and compass heading
//! - [`RenderableFactory`] / [`RenderableAsset`]: asynchronously built label views
//! - [`UiSignals`]: loading indicator and fatal error reporting
//!
//! ## Architecture
//!
//! ```text
//!  SessionProvider ──creates──► ArSession ──frames──► Frame { camera, tracking, planes }
//!                                   │
//!                                   └──anchor_store──► AnchorStore ◄──owns── Anchor
//!  GeoSensor ──fix──► DevicePose = camera pose + tracking state + geo fix
//! ```
//!
//! ## Features
//!
//! - `sim` (default): [`sim`] module with a scripted backend implementing
//!   every trait, used by tests and the runtime walkthrough.

pub mod anchor;
pub mod error;
pub mod render;
pub mod sensor;
pub mod session;

#[cfg(feature = "sim")]
pub mod sim;

pub use anchor::{Anchor, AnchorId, AnchorStore};
pub use error::{Result, XrError};
pub use render::{RenderableAsset, RenderableCallback, RenderableFactory, UiSignals, ViewDescriptor};
pub use sensor::{GeoFix, GeoSensor};
pub use session::{ArSession, SessionProvider, SessionState};

use locar_core::Id;
use locar_math::{Quatd, Vec3d};

/// Camera tracking confidence reported by the AR runtime
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackingState {
    /// Pose is being estimated; anchors may be created
    Tracking,
    /// Pose is temporarily lost
    NotTracking,
    /// Tracking has been paused (session paused or interrupted)
    Paused,
}

impl Default for TrackingState {
    fn default() -> Self {
        Self::NotTracking
    }
}

impl TrackingState {
    #[inline]
    pub fn is_tracking(self) -> bool {
        self == TrackingState::Tracking
    }
}

/// Pose (position + orientation) in scene space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3d,
    pub orientation: Quatd,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3d::ZERO,
            orientation: Quatd::IDENTITY,
        }
    }
}

impl Pose {
    /// Create a new pose
    pub fn new(position: Vec3d, orientation: Quatd) -> Self {
        Self { position, orientation }
    }

    /// Move by `delta` keeping the orientation
    pub fn translated(&self, delta: Vec3d) -> Pose {
        Pose::new(self.position + delta, self.orientation)
    }
}

/// Plane identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlaneId(pub Id);

/// A detected surface reported by the tracking runtime
#[derive(Clone, Debug)]
pub struct Plane {
    pub id: PlaneId,
    /// Centre of the plane in scene space
    pub center: Pose,
    /// Extent along local X and Z, metres
    pub extent: [f64; 2],
    pub tracking_state: TrackingState,
}

/// One camera frame as seen by the anchor engine
#[derive(Clone, Debug)]
pub struct Frame {
    /// Monotonic frame timestamp in nanoseconds
    pub timestamp_ns: u64,
    /// Camera pose in scene space
    pub camera: Pose,
    /// Camera tracking state for this frame
    pub tracking_state: TrackingState,
    /// Planes whose state changed during this frame
    pub updated_planes: Vec<Plane>,
}

impl Frame {
    pub fn tracking_state(&self) -> TrackingState {
        self.tracking_state
    }

    pub fn updated_planes(&self) -> impl Iterator<Item = &Plane> {
        self.updated_planes.iter()
    }

    /// True if any plane updated this frame is being tracked
    pub fn has_tracked_plane(&self) -> bool {
        self.updated_planes()
            .any(|plane| plane.tracking_state.is_tracking())
    }
}

/// Source of camera frames
pub trait TrackingProvider {
    /// Latest frame, `None` before the first camera image arrives
    fn current_frame(&self) -> Option<Frame>;
}

/// Device pose as used by anchor operations: scene pose, tracking state at
/// sampling time and the geographic fix the scene is aligned to
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DevicePose {
    pub pose: Pose,
    pub tracking: TrackingState,
    pub fix: Option<GeoFix>,
}

impl DevicePose {
    pub fn new(pose: Pose, tracking: TrackingState, fix: Option<GeoFix>) -> Self {
        Self { pose, tracking, fix }
    }

    /// Combine a frame with the latest sensor fix
    pub fn from_frame(frame: &Frame, fix: Option<GeoFix>) -> Self {
        Self::new(frame.camera, frame.tracking_state, fix)
    }

    /// Scene-space camera position
    #[inline]
    pub fn position(&self) -> Vec3d {
        self.pose.position
    }

    /// Anchors can only be placed while tracking with a geo fix available
    pub fn is_tracked(&self) -> bool {
        self.tracking.is_tracking() && self.fix.is_some()
    }

    /// Same device, moved to `position`
    pub fn with_position(mut self, position: Vec3d) -> Self {
        self.pose.position = position;
        self
    }
}

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::{
        Anchor, AnchorId, AnchorStore, ArSession, DevicePose, Frame, GeoFix, GeoSensor,
        Plane, PlaneId, Pose, RenderableAsset, RenderableCallback, RenderableFactory,
        SessionProvider, SessionState, TrackingProvider, TrackingState, UiSignals,
        ViewDescriptor, XrError,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use locar_math::{radians, GeoCoord};

    fn plane(index: u32, tracking_state: TrackingState) -> Plane {
        Plane {
            id: PlaneId(Id::new(u64::from(index))),
            center: Pose::default(),
            extent: [1.0, 1.0],
            tracking_state,
        }
    }

    #[test]
    fn test_pose_translation_keeps_orientation() {
        let pose = Pose::new(Vec3d::ZERO, Quatd::from_rotation_y(radians(90.0)));
        let moved = pose.translated(Vec3d::new(1.0, 0.0, -2.0));
        assert_eq!(moved.position, Vec3d::new(1.0, 0.0, -2.0));
        assert_eq!(moved.orientation, pose.orientation);
    }

    #[test]
    fn test_frame_plane_detection() {
        let mut frame = Frame {
            timestamp_ns: 0,
            camera: Pose::default(),
            tracking_state: TrackingState::Tracking,
            updated_planes: vec![plane(0, TrackingState::Paused)],
        };
        assert!(!frame.has_tracked_plane());

        frame.updated_planes.push(plane(1, TrackingState::Tracking));
        assert!(frame.has_tracked_plane());
        assert_eq!(frame.updated_planes().count(), 2);
    }

    #[test]
    fn test_device_pose_requires_fix_and_tracking() {
        let fix = GeoFix::new(GeoCoord::new(51.5, -0.1), 0.0);
        assert!(DevicePose::new(Pose::default(), TrackingState::Tracking, Some(fix)).is_tracked());
        assert!(!DevicePose::new(Pose::default(), TrackingState::Tracking, None).is_tracked());
        assert!(!DevicePose::new(Pose::default(), TrackingState::Paused, Some(fix)).is_tracked());
    }
}
