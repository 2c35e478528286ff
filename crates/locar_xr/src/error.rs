//! Error types for AR collaborators

use thiserror::Error;

/// Errors raised by the AR runtime, sensors and asset builders
#[derive(Debug, Clone, Error, PartialEq)]
pub enum XrError {
    /// AR is not supported or the runtime could not create a session
    #[error("AR session unavailable: {0}")]
    SessionUnavailable(String),

    /// Camera could not be opened while resuming
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    /// Camera or location permission was refused
    #[error("Camera permission is needed to run this application")]
    PermissionDenied,

    /// Anchor could not be created or released
    #[error("Anchor operation failed: {0}")]
    AnchorFailed(String),

    /// A renderable failed to build
    #[error("Renderable build failed: {0}")]
    AssetFailed(String),

    /// Operation requires a tracked camera
    #[error("Camera is not tracking")]
    NotTracking,
}

impl XrError {
    /// Errors after which the host activity cannot continue
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            XrError::SessionUnavailable(_) | XrError::CameraUnavailable(_) | XrError::PermissionDenied
        )
    }
}

/// Result type for XR operations
pub type Result<T> = std::result::Result<T, XrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(XrError::SessionUnavailable("no ARCore".into()).is_fatal());
        assert!(XrError::CameraUnavailable("busy".into()).is_fatal());
        assert!(XrError::PermissionDenied.is_fatal());
        assert!(!XrError::NotTracking.is_fatal());
        assert!(!XrError::AnchorFailed("limit".into()).is_fatal());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            XrError::CameraUnavailable("in use".into()).to_string(),
            "Camera unavailable: in use"
        );
    }
}
