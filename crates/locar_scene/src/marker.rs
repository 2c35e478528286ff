//! Geo markers: immutable points of interest

use crate::error::{Result, SceneError};
use locar_math::GeoCoord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of point of interest
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerCategory {
    CoffeeShop,
    VinBuilding,
    Landmark,
    Transit,
    #[default]
    Other,
}

impl fmt::Display for MarkerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MarkerCategory::CoffeeShop => "coffee shop",
            MarkerCategory::VinBuilding => "vin building",
            MarkerCategory::Landmark => "landmark",
            MarkerCategory::Transit => "transit",
            MarkerCategory::Other => "other",
        };
        f.write_str(name)
    }
}

/// A geographically located point of interest
///
/// Immutable once constructed. Two markers are the same marker when their
/// coordinates and title match exactly; the category does not take part.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeoMarker {
    latitude: f64,
    longitude: f64,
    title: String,
    #[serde(default)]
    category: MarkerCategory,
}

impl GeoMarker {
    pub fn new(latitude: f64, longitude: f64, title: impl Into<String>, category: MarkerCategory) -> Self {
        Self {
            latitude,
            longitude,
            title: title.into(),
            category,
        }
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[inline]
    pub fn coord(&self) -> GeoCoord {
        GeoCoord::new(self.latitude, self.longitude)
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub fn category(&self) -> MarkerCategory {
        self.category
    }

    /// Identity key used by the scene's replacement policy
    pub fn identity(&self) -> MarkerIdentity {
        MarkerIdentity {
            latitude_bits: self.latitude.to_bits(),
            longitude_bits: self.longitude.to_bits(),
            title: self.title.clone(),
        }
    }

    /// True if `other` is the same point of interest
    pub fn same_identity(&self, other: &GeoMarker) -> bool {
        self.latitude.to_bits() == other.latitude.to_bits()
            && self.longitude.to_bits() == other.longitude.to_bits()
            && self.title == other.title
    }

    /// Check coordinate ranges and title
    pub fn validate(&self) -> Result<()> {
        if !self.coord().is_valid() {
            return Err(SceneError::InvalidMarker(format!(
                "'{}' has coordinates out of range ({}, {})",
                self.title, self.latitude, self.longitude
            )));
        }
        if self.title.trim().is_empty() {
            return Err(SceneError::InvalidMarker(format!(
                "marker at ({}, {}) has an empty title",
                self.latitude, self.longitude
            )));
        }
        Ok(())
    }
}

impl PartialEq for GeoMarker {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl Eq for GeoMarker {}

impl fmt::Display for GeoMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.6}, {:.6})", self.title, self.latitude, self.longitude)
    }
}

/// Hashable marker identity: exact coordinate bit patterns plus title
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MarkerIdentity {
    latitude_bits: u64,
    longitude_bits: u64,
    title: String,
}

impl MarkerIdentity {
    pub fn title(&self) -> &str {
        &self.title
    }
}
