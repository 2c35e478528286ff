//! Geodesy: geographic coordinates and their projection into scene space
//!
//! Offsets are expressed in a local East-North-Up frame centred on the
//! device, then mapped into scene axes (`east -> +X`, `up -> +Y`,
//! `north -> -Z`) and turned by the compass heading of the scene's forward
//! axis.

use crate::quaternion::Quatd;
use crate::vector::Vec3d;
use crate::{degrees, radians, wrap_degrees};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mean Earth radius (IUGG) in metres
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A latitude/longitude pair in decimal degrees (WGS84)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoCoord {
    pub latitude: f64,
    pub longitude: f64,
}

/// How a geographic delta is flattened into a local offset
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Projection {
    /// Equirectangular approximation around the mean latitude. Accurate to
    /// well under a metre within a few kilometres, which covers anything a
    /// camera can show.
    #[default]
    LocalTangentPlane,
    /// Haversine distance along the initial great-circle bearing. Keeps the
    /// true ground distance for far-away markers.
    GreatCircle,
}

impl GeoCoord {
    /// Create a new coordinate
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Latitude within [-90, 90], longitude within [-180, 180], both finite
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle (haversine) distance in metres
    pub fn distance_to(&self, other: &GeoCoord) -> f64 {
        let lat1 = radians(self.latitude);
        let lat2 = radians(other.latitude);
        let dlat = lat2 - lat1;
        let dlon = radians(other.longitude - self.longitude);

        let a = (dlat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon * 0.5).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }

    /// Initial great-circle bearing towards `other`, degrees clockwise from north
    pub fn bearing_to(&self, other: &GeoCoord) -> f64 {
        let lat1 = radians(self.latitude);
        let lat2 = radians(other.latitude);
        let dlon = radians(other.longitude - self.longitude);

        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        wrap_degrees(degrees(y.atan2(x)))
    }

    /// Offset of `other` from `self` as `(east, north)` metres
    pub fn east_north_to(&self, other: &GeoCoord, projection: Projection) -> (f64, f64) {
        match projection {
            Projection::LocalTangentPlane => {
                let mean_lat = radians((self.latitude + other.latitude) * 0.5);
                let mut dlon = other.longitude - self.longitude;
                if dlon > 180.0 {
                    dlon -= 360.0;
                } else if dlon < -180.0 {
                    dlon += 360.0;
                }
                let east = radians(dlon) * EARTH_RADIUS_M * mean_lat.cos();
                let north = radians(other.latitude - self.latitude) * EARTH_RADIUS_M;
                (east, north)
            }
            Projection::GreatCircle => {
                let distance = self.distance_to(other);
                let bearing = radians(self.bearing_to(other));
                (distance * bearing.sin(), distance * bearing.cos())
            }
        }
    }

    /// Scene-space offset of `other` relative to a device standing at `self`
    ///
    /// `heading_deg` is the compass bearing of the scene's `-Z` axis and
    /// `up` the height of the target relative to the device.
    pub fn scene_offset_to(
        &self,
        other: &GeoCoord,
        heading_deg: f64,
        up: f64,
        projection: Projection,
    ) -> Vec3d {
        let (east, north) = self.east_north_to(other, projection);
        let unrotated = Vec3d::new(east, up, -north);
        Quatd::from_rotation_y(radians(heading_deg)).rotate(unrotated)
    }
}
