//! Error types for the anchor engine

use crate::record::RecordId;
use locar_xr::XrError;
use thiserror::Error;

/// Anchor engine errors
#[derive(Debug, Error)]
pub enum SceneError {
    /// Device pose is not tracked (or has no geo fix) at call time
    #[error("Device pose unavailable: camera not tracking or no location fix")]
    PoseUnavailable,

    /// Operation on a record that has already been detached
    #[error("Record {0} is detached")]
    RecordDetached(RecordId),

    /// Marker failed validation
    #[error("Invalid marker: {0}")]
    InvalidMarker(String),

    /// Configuration rejected by validation
    #[error("Invalid scene configuration: {0}")]
    Config(String),

    /// Catalog or configuration JSON could not be parsed
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from an AR collaborator
    #[error(transparent)]
    Xr(#[from] XrError),
}

impl SceneError {
    /// Errors that only affect the current frame and resolve on their own
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SceneError::PoseUnavailable | SceneError::Xr(XrError::NotTracking)
        )
    }
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;
