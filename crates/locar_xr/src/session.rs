//! AR session bootstrap and lifecycle

use crate::anchor::AnchorStore;
use crate::error::Result;
use crate::TrackingProvider;
use std::sync::Arc;

/// AR session state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Created, camera not started yet
    Idle,
    /// Camera running, frames flowing
    Running,
    /// Camera stopped, session kept
    Paused,
    /// Released; no further calls are valid
    Destroyed,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// A live AR session: frame source plus anchor allocation
pub trait ArSession: TrackingProvider + Send {
    /// Start or restart the camera
    ///
    /// Fails with [`crate::XrError::CameraUnavailable`] if the camera cannot
    /// be opened.
    fn resume(&mut self) -> Result<()>;

    /// Stop the camera, keeping tracked state
    fn pause(&mut self);

    /// Release the session and all of its native resources
    fn destroy(&mut self);

    /// Current session state
    fn state(&self) -> SessionState;

    /// Anchor allocator bound to this session
    fn anchor_store(&self) -> Arc<dyn AnchorStore>;
}

/// Creates AR sessions for the host platform
pub trait SessionProvider: Send {
    /// Try to create a session
    ///
    /// `Ok(None)` means the platform asked for an install or permission step
    /// first; the caller should try again on the next resume. Missing AR
    /// support fails with [`crate::XrError::SessionUnavailable`].
    fn create_session(&mut self, install_requested: bool) -> Result<Option<Box<dyn ArSession>>>;

    /// Whether camera and location permissions are currently granted
    fn has_permissions(&self) -> bool;
}
