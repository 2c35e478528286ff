//! Double-precision scene vectors
//!
//! Scene offsets to geo markers can reach kilometres, so everything the
//! anchor engine computes stays in f64 until it is handed to a renderer.

use core::ops::{Add, Mul, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Double-precision 3D vector
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3d {
    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Scene forward (`-Z`)
    pub const FORWARD: Self = Self::new(0.0, 0.0, -1.0);

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Length (magnitude)
    #[inline]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Distance to another point
    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }
}

impl Add for Vec3d {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3d {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3d {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Precision status of a scene offset once it is narrowed to f32
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PrecisionStatus {
    /// Sub-centimetre after narrowing (< 100km from the scene origin)
    Good,
    /// Centimetre-level jitter (100km - 1000km)
    Warning,
    /// Visible jitter (> 1000km)
    Critical,
}

/// Thresholds for precision checking (in meters)
pub const PRECISION_WARNING_THRESHOLD: f64 = 100_000.0;
pub const PRECISION_CRITICAL_THRESHOLD: f64 = 1_000_000.0;

/// Classify how well a scene offset survives narrowing to f32
pub fn check_precision(offset: Vec3d) -> PrecisionStatus {
    let max_coord = offset.x.abs().max(offset.y.abs()).max(offset.z.abs());

    if max_coord > PRECISION_CRITICAL_THRESHOLD {
        PrecisionStatus::Critical
    } else if max_coord > PRECISION_WARNING_THRESHOLD {
        PrecisionStatus::Warning
    } else {
        PrecisionStatus::Good
    }
}
