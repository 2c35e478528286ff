//! Host-facing entry point wiring the lifecycle and the frame loop together

use crate::catalog::validate_markers;
use crate::config::SceneConfig;
use crate::error::Result;
use crate::frame_loop::{FrameOutcome, FrameUpdateLoop};
use crate::lifecycle::{LifecycleState, ResumeOutcome, SessionLifecycle};
use crate::loading::LoadingIndicator;
use crate::marker::GeoMarker;
use crate::scene::AnchorScene;
use locar_xr::{GeoSensor, RenderableFactory, SessionProvider, UiSignals};
use std::sync::Arc;

/// A geo-marker AR view: call the `on_*` hooks from the host's lifecycle
/// and frame callbacks.
pub struct LocarApp {
    lifecycle: SessionLifecycle,
    frames: FrameUpdateLoop,
}

impl LocarApp {
    /// Validate the configuration and markers, then wire up collaborators
    pub fn new(
        markers: Vec<GeoMarker>,
        config: SceneConfig,
        provider: Box<dyn SessionProvider>,
        sensor: Box<dyn GeoSensor>,
        ui: Arc<dyn UiSignals>,
    ) -> Result<Self> {
        validate_markers(&markers)?;

        let loading = Arc::new(LoadingIndicator::new(ui));
        let count = markers.len();
        let frames = FrameUpdateLoop::new(markers, config, sensor, Arc::clone(&loading))?;
        log::info!("Locar app created with {} markers", count);
        Ok(Self {
            lifecycle: SessionLifecycle::new(provider, loading),
            frames,
        })
    }

    /// Start building marker views
    pub fn on_create(&mut self, factory: &dyn RenderableFactory) {
        self.frames.request_assets(factory);
    }

    pub fn on_resume(&mut self) -> ResumeOutcome {
        self.lifecycle.on_resume(self.frames.scene_mut())
    }

    pub fn on_pause(&mut self) {
        self.lifecycle.on_pause(self.frames.scene_mut());
    }

    /// Per-frame update
    pub fn on_update(&mut self) -> FrameOutcome {
        if self.lifecycle.is_finished() {
            return FrameOutcome::Released;
        }
        match self.lifecycle.session() {
            Some(session) => self.frames.on_frame(session),
            None => FrameOutcome::NoSession,
        }
    }

    pub fn on_permissions_result(&mut self, granted: bool) -> bool {
        self.lifecycle.on_permissions_result(granted)
    }

    /// Release every anchor, then the session
    pub fn on_destroy(&mut self) {
        self.frames.teardown();
        self.lifecycle.on_destroy();
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn scene(&self) -> Option<&AnchorScene> {
        self.frames.scene()
    }

    pub fn scene_mut(&mut self) -> Option<&mut AnchorScene> {
        self.frames.scene_mut()
    }

    pub fn frames(&self) -> &FrameUpdateLoop {
        &self.frames
    }
}
