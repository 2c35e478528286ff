//! # locar_math - Scene Math and Geodesy
//!
//! Double-precision primitives for placing geographic points into an AR
//! scene:
//! - [`Vec3d`] / [`Quatd`] for scene-space positions and orientations
//! - [`GeoCoord`] with local-tangent-plane and great-circle projections
//!
//! Scene convention follows the camera frame of mobile AR runtimes:
//! `+X` right, `+Y` up, `-Z` forward.

pub mod vector;
pub mod quaternion;
pub mod geo;

pub use vector::*;
pub use quaternion::*;
pub use geo::*;

/// Common math constants
pub mod consts {
    pub const PI: f64 = core::f64::consts::PI;
    pub const TAU: f64 = PI * 2.0;
    pub const DEG_TO_RAD: f64 = PI / 180.0;
    pub const RAD_TO_DEG: f64 = 180.0 / PI;
    pub const EPSILON: f64 = 1e-9;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f64) -> f64 {
    degrees * consts::DEG_TO_RAD
}

/// Convert radians to degrees
#[inline]
pub fn degrees(radians: f64) -> f64 {
    radians * consts::RAD_TO_DEG
}

/// Wrap an angle in degrees into `[0, 360)`
#[inline]
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle % 360.0;
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

pub mod prelude {
    pub use crate::vector::{Vec3d, PrecisionStatus, check_precision};
    pub use crate::quaternion::Quatd;
    pub use crate::geo::{GeoCoord, Projection, EARTH_RADIUS_M};
    pub use crate::{radians, degrees, wrap_degrees};
}
