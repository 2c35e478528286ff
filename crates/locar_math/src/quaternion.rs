//! Quaternion for scene orientations

use crate::vector::Vec3d;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Double-precision unit quaternion
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Quatd {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quatd {
    /// Identity quaternion (no rotation)
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation about the Y (up) axis
    ///
    /// Positive angles turn `-Z` toward `-X`, i.e. counter-clockwise seen
    /// from above.
    #[inline]
    pub fn from_rotation_y(angle: f64) -> Self {
        let half = angle * 0.5;
        Self::new(0.0, half.sin(), 0.0, half.cos())
    }

    /// Rotate a vector
    pub fn rotate(self, v: Vec3d) -> Vec3d {
        let qv = Vec3d::new(self.x, self.y, self.z);
        let uv = qv.cross(v);
        let uuv = qv.cross(uv);
        v + (uv * self.w + uuv) * 2.0
    }
}

impl Default for Quatd {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radians;

    fn approx(a: Vec3d, b: Vec3d) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn test_identity_rotation() {
        let v = Vec3d::new(1.0, 2.0, 3.0);
        assert!(approx(Quatd::IDENTITY.rotate(v), v));
    }

    #[test]
    fn test_rotation_y_quarter_turn() {
        let q = Quatd::from_rotation_y(radians(90.0));
        assert!(approx(q.rotate(Vec3d::new(1.0, 0.0, 0.0)), Vec3d::FORWARD));
        assert!(approx(q.rotate(Vec3d::FORWARD), Vec3d::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_half_turn_reverses_forward() {
        let q = Quatd::from_rotation_y(radians(180.0));
        assert!(approx(q.rotate(Vec3d::FORWARD), Vec3d::new(0.0, 0.0, 1.0)));
    }
}
