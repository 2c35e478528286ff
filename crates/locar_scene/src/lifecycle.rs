//! Host lifecycle: resume, pause and destroy
//!
//! Owns the AR session. On resume the session is created on demand through
//! the [`SessionProvider`]; platforms that first need an install step or a
//! permission grant return no session, and creation is retried on the next
//! resume. Fatal errors are reported once and move the lifecycle to
//! [`LifecycleState::Finished`].

use crate::loading::LoadingIndicator;
use crate::scene::AnchorScene;
use locar_xr::{ArSession, SessionProvider, XrError};
use std::sync::Arc;

/// Lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, never resumed
    Created,
    /// Resumed, but the platform has not produced a session yet
    AwaitingSession,
    /// Session running
    Running,
    /// Paused by the host
    Paused,
    /// A fatal error was reported; the host should close
    Finished,
    /// Session released
    Destroyed,
}

/// Result of [`SessionLifecycle::on_resume`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResumeOutcome {
    Resumed,
    AwaitingSession,
    Finished,
}

/// Session ownership and lifecycle hooks
pub struct SessionLifecycle {
    provider: Box<dyn SessionProvider>,
    session: Option<Box<dyn ArSession>>,
    loading: Arc<LoadingIndicator>,
    install_requested: bool,
    state: LifecycleState,
}

impl SessionLifecycle {
    pub fn new(provider: Box<dyn SessionProvider>, loading: Arc<LoadingIndicator>) -> Self {
        Self {
            provider,
            session: None,
            loading,
            install_requested: false,
            state: LifecycleState::Created,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, LifecycleState::Finished | LifecycleState::Destroyed)
    }

    pub fn install_requested(&self) -> bool {
        self.install_requested
    }

    pub fn session(&self) -> Option<&dyn ArSession> {
        self.session.as_deref()
    }

    /// Resume the scene's sensors and the AR session, creating it if needed
    pub fn on_resume(&mut self, scene: Option<&mut AnchorScene>) -> ResumeOutcome {
        if self.is_finished() {
            return ResumeOutcome::Finished;
        }

        if let Some(scene) = scene {
            scene.resume();
        }

        if self.session.is_none() {
            match self.provider.create_session(self.install_requested) {
                Ok(Some(session)) => {
                    log::info!("AR session created");
                    self.session = Some(session);
                }
                Ok(None) => {
                    self.install_requested = self.provider.has_permissions();
                    self.state = LifecycleState::AwaitingSession;
                    log::info!(
                        "AR session not available yet (install_requested={})",
                        self.install_requested
                    );
                    return ResumeOutcome::AwaitingSession;
                }
                Err(e) => return self.finish(e),
            }
        }

        let resumed = match self.session.as_mut() {
            Some(session) => session.resume(),
            None => return ResumeOutcome::AwaitingSession,
        };
        if let Err(e) = resumed {
            let e = match e {
                XrError::CameraUnavailable(_) => e,
                other => XrError::CameraUnavailable(other.to_string()),
            };
            return self.finish(e);
        }

        self.state = LifecycleState::Running;
        self.loading.show();
        log::info!("AR session resumed");
        ResumeOutcome::Resumed
    }

    /// Pause the scene's sensors, then the session
    pub fn on_pause(&mut self, scene: Option<&mut AnchorScene>) {
        if let Some(scene) = scene {
            scene.pause();
        }
        if let Some(session) = self.session.as_mut() {
            session.pause();
            log::info!("AR session paused");
        }
        if self.state == LifecycleState::Running {
            self.state = LifecycleState::Paused;
        }
    }

    /// Release the session
    pub fn on_destroy(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.destroy();
            log::info!("AR session destroyed");
        }
        self.state = LifecycleState::Destroyed;
    }

    /// Outcome of the host's permission prompt
    ///
    /// Returns `false` if the lifecycle finished because permission was
    /// refused.
    pub fn on_permissions_result(&mut self, granted: bool) -> bool {
        if granted || self.provider.has_permissions() {
            return true;
        }
        self.finish(XrError::PermissionDenied);
        false
    }

    fn finish(&mut self, error: XrError) -> ResumeOutcome {
        log::error!("Unrecoverable session error: {}", error);
        self.loading.fatal(&error);
        self.state = LifecycleState::Finished;
        ResumeOutcome::Finished
    }
}
