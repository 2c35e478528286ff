//! Marker catalogs
//!
//! A catalog is a JSON array of markers:
//!
//! ```json
//! [
//!   { "latitude": 20.9964, "longitude": 105.8689, "title": "The Coffee House", "category": "coffee_shop" }
//! ]
//! ```

use crate::error::{Result, SceneError};
use crate::marker::{GeoMarker, MarkerCategory};
use std::collections::HashSet;

/// Parse and validate a JSON marker catalog
///
/// Duplicate identities are rejected: the scene sizes its capacity from the
/// catalog, and a duplicate would hold a slot no other marker can take.
pub fn parse_catalog(json: &str) -> Result<Vec<GeoMarker>> {
    let markers: Vec<GeoMarker> = serde_json::from_str(json)?;
    validate_markers(&markers)?;

    log::debug!("Parsed catalog with {} markers", markers.len());
    Ok(markers)
}

/// Validate every marker and reject duplicate identities
pub fn validate_markers(markers: &[GeoMarker]) -> Result<()> {
    let mut seen = HashSet::with_capacity(markers.len());
    for marker in markers {
        marker.validate()?;
        if !seen.insert(marker.identity()) {
            return Err(SceneError::InvalidMarker(format!("duplicate marker {}", marker)));
        }
    }
    Ok(())
}

/// The three sample markers around Times City, Hanoi
pub fn sample_markers() -> Vec<GeoMarker> {
    vec![
        GeoMarker::new(
            20.9964248899242,
            105.868930437133,
            "The Coffee House",
            MarkerCategory::CoffeeShop,
        ),
        GeoMarker::new(
            20.996344464798728,
            105.8685612447664,
            "T5 - Times City",
            MarkerCategory::VinBuilding,
        ),
        GeoMarker::new(
            20.99712869246975,
            105.86797196605553,
            "Century Tower",
            MarkerCategory::VinBuilding,
        ),
    ]
}
