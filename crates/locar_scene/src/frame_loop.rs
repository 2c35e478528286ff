//! Per-frame driver
//!
//! Every frame runs the same pipeline, stopping at the first step that
//! cannot proceed:
//!
//! 1. wait until every renderable build has reported
//! 2. build the [`AnchorScene`] (once)
//! 3. fetch a tracked camera frame
//! 4. place pending markers, periodically re-anchor
//! 5. tick the scene
//! 6. dismiss the loading indicator once a plane is tracked

use crate::assets::{request_renderables, AssetLatch, LoadedAsset};
use crate::config::SceneConfig;
use crate::error::Result;
use crate::loading::LoadingIndicator;
use crate::marker::GeoMarker;
use crate::scene::{AnchorScene, Placement, TickReport};
use locar_xr::{ArSession, GeoSensor, RenderableFactory, TrackingState};
use std::sync::Arc;

/// Scene construction state
pub enum SceneSlot {
    /// Waiting for assets; holds the sensor the scene will own
    Uninitialized(Box<dyn GeoSensor>),
    /// Scene built
    Initialized(AnchorScene),
    /// Scene torn down; terminal
    Released,
}

impl SceneSlot {
    pub fn is_initialized(&self) -> bool {
        matches!(self, SceneSlot::Initialized(_))
    }
}

/// How far a frame got through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// No AR session yet
    NoSession,
    /// Renderable builds still outstanding
    AssetsPending,
    /// The session produced no frame
    NoFrame,
    /// Camera not tracking; scene untouched
    NotTracking(TrackingState),
    /// Scene ticked
    Updated(FrameSummary),
    /// Scene torn down
    Released,
}

/// Work done by an updated frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSummary {
    /// Frame number (tracked and untracked)
    pub frame: u64,
    /// Placements made this frame
    pub placements: Vec<Placement>,
    /// Records re-anchored by the periodic refresh
    pub refreshed: usize,
    pub tick: TickReport,
    /// Loading indicator dismissed this frame
    pub loading_hidden: bool,
}

/// Drives an [`AnchorScene`] from camera frames
pub struct FrameUpdateLoop {
    markers: Vec<GeoMarker>,
    config: SceneConfig,
    latch: AssetLatch,
    slot: SceneSlot,
    pending: Vec<LoadedAsset>,
    loading: Arc<LoadingIndicator>,
    assets_requested: bool,
    frame: u64,
    tracked_frames: u64,
}

impl FrameUpdateLoop {
    /// Fails if `config` does not validate
    pub fn new(
        markers: Vec<GeoMarker>,
        config: SceneConfig,
        sensor: Box<dyn GeoSensor>,
        loading: Arc<LoadingIndicator>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            latch: AssetLatch::new(markers.len()),
            markers,
            config,
            slot: SceneSlot::Uninitialized(sensor),
            pending: Vec::new(),
            loading,
            assets_requested: false,
            frame: 0,
            tracked_frames: 0,
        })
    }

    /// Start building one renderable per marker. Only the first call builds.
    pub fn request_assets(&mut self, factory: &dyn RenderableFactory) {
        if self.assets_requested {
            log::debug!("Renderables already requested");
            return;
        }
        self.assets_requested = true;
        request_renderables(factory, &self.markers, &self.config.label_layout, &self.latch);
    }

    pub fn latch(&self) -> &AssetLatch {
        &self.latch
    }

    pub fn slot(&self) -> &SceneSlot {
        &self.slot
    }

    pub fn scene(&self) -> Option<&AnchorScene> {
        match &self.slot {
            SceneSlot::Initialized(scene) => Some(scene),
            _ => None,
        }
    }

    pub fn scene_mut(&mut self) -> Option<&mut AnchorScene> {
        match &mut self.slot {
            SceneSlot::Initialized(scene) => Some(scene),
            _ => None,
        }
    }

    /// Markers loaded but not yet placed
    pub fn pending_markers(&self) -> impl Iterator<Item = &GeoMarker> {
        self.pending.iter().map(|asset| &asset.marker)
    }

    /// Process one camera frame from `session`
    pub fn on_frame(&mut self, session: &dyn ArSession) -> FrameOutcome {
        self.frame += 1;

        if let Some(outcome) = self.ensure_scene(session) {
            return outcome;
        }
        let SceneSlot::Initialized(scene) = &mut self.slot else {
            return FrameOutcome::Released;
        };

        let Some(frame) = session.current_frame() else {
            return FrameOutcome::NoFrame;
        };
        let tracking = frame.tracking_state();
        if !tracking.is_tracking() {
            return FrameOutcome::NotTracking(tracking);
        }
        self.tracked_frames += 1;

        let device = scene.device_pose(&frame);
        let mut summary = FrameSummary {
            frame: self.frame,
            ..Default::default()
        };

        self.pending.retain(|asset| {
            match scene.add_or_replace(asset.marker.clone(), &asset.renderable, &device) {
                Ok(Placement::Dropped) => {
                    log::warn!("No room for '{}', skipping", asset.marker.title());
                    summary.placements.push(Placement::Dropped);
                    false
                }
                Ok(placement) => {
                    summary.placements.push(placement);
                    false
                }
                Err(e) if e.is_transient() => true,
                Err(e) => {
                    log::warn!(
                        "Failed to place '{}', retrying next frame: {}",
                        asset.marker.title(),
                        e
                    );
                    true
                }
            }
        });

        if let Some(interval) = self.config.refresh_interval_frames.filter(|&n| n > 0) {
            if self.tracked_frames % u64::from(interval) == 0 {
                summary.refreshed = scene.refresh_anchors(&device);
            }
        }

        summary.tick = scene.tick(&device, tracking);

        if self.loading.is_shown() && frame.has_tracked_plane() {
            self.loading.hide();
            summary.loading_hidden = true;
        }

        FrameOutcome::Updated(summary)
    }

    /// Tear the scene down; later frames report [`FrameOutcome::Released`]
    pub fn teardown(&mut self) {
        self.pending.clear();
        if let SceneSlot::Initialized(mut scene) = std::mem::replace(&mut self.slot, SceneSlot::Released) {
            scene.teardown();
        }
    }

    /// Build the scene once the latch opens. `Some` ends the frame.
    fn ensure_scene(&mut self, session: &dyn ArSession) -> Option<FrameOutcome> {
        match self.slot {
            SceneSlot::Initialized(_) => return None,
            SceneSlot::Released => return Some(FrameOutcome::Released),
            SceneSlot::Uninitialized(_) => {}
        }

        let Some(assets) = self.latch.take_if_ready() else {
            return Some(FrameOutcome::AssetsPending);
        };
        let SceneSlot::Uninitialized(sensor) = std::mem::replace(&mut self.slot, SceneSlot::Released) else {
            return Some(FrameOutcome::Released);
        };

        let mut scene = AnchorScene::new(
            self.markers.len(),
            session.anchor_store(),
            sensor,
            self.config.clone(),
        );
        scene.resume();
        log::info!(
            "Scene initialized: {} of {} markers ready to place",
            assets.len(),
            self.markers.len()
        );

        self.pending = assets;
        self.slot = SceneSlot::Initialized(scene);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SceneError;
    use crate::marker::MarkerCategory;
    use locar_math::GeoCoord;
    use locar_xr::sim::{BuildMode, RecordingUi, SimRenderableFactory, SimWorld};
    use locar_xr::{GeoFix, SessionProvider};

    struct Fixture {
        world: SimWorld,
        session: Box<dyn ArSession>,
        ui: Arc<RecordingUi>,
        loading: Arc<LoadingIndicator>,
        factory: SimRenderableFactory,
    }

    fn fixture() -> Fixture {
        let world = SimWorld::new(GeoFix::new(GeoCoord::new(51.5, -0.1), 0.0));
        let mut session = world.session_provider().create_session(false).unwrap().unwrap();
        session.resume().unwrap();
        let ui = Arc::new(RecordingUi::new());
        let loading = Arc::new(LoadingIndicator::new(ui.clone()));
        Fixture {
            world,
            session,
            ui,
            loading,
            factory: SimRenderableFactory::new(BuildMode::Deferred),
        }
    }

    fn markers() -> Vec<GeoMarker> {
        vec![
            GeoMarker::new(51.5005, -0.1, "A", MarkerCategory::Other),
            GeoMarker::new(51.501, -0.1005, "B", MarkerCategory::Other),
        ]
    }

    fn frame_loop(fx: &Fixture, config: SceneConfig) -> FrameUpdateLoop {
        FrameUpdateLoop::new(markers(), config, Box::new(fx.world.geo_sensor()), fx.loading.clone()).unwrap()
    }

    #[test]
    fn test_waits_for_every_asset() {
        let fx = fixture();
        let mut frames = frame_loop(&fx, SceneConfig::default());
        frames.request_assets(&fx.factory);
        frames.request_assets(&fx.factory);
        assert_eq!(fx.factory.pending(), 2);

        fx.factory.complete_next();
        assert_eq!(frames.on_frame(fx.session.as_ref()), FrameOutcome::AssetsPending);
        assert!(!frames.slot().is_initialized());

        fx.factory.complete_next();
        fx.world.set_tracking(TrackingState::Tracking);
        assert!(matches!(frames.on_frame(fx.session.as_ref()), FrameOutcome::Updated(_)));
        assert!(frames.slot().is_initialized());
        assert!(fx.world.sensor_running());
        assert_eq!(frames.scene().map(AnchorScene::capacity), Some(2));
    }

    #[test]
    fn test_not_tracking_leaves_markers_pending() {
        let fx = fixture();
        let mut frames = frame_loop(&fx, SceneConfig::default());
        frames.request_assets(&fx.factory);
        fx.factory.complete_all();

        let outcome = frames.on_frame(fx.session.as_ref());
        assert_eq!(outcome, FrameOutcome::NotTracking(TrackingState::NotTracking));
        assert_eq!(frames.pending_markers().count(), 2);
        assert_eq!(frames.scene().map(AnchorScene::len), Some(0));

        fx.world.set_tracking(TrackingState::Tracking);
        match frames.on_frame(fx.session.as_ref()) {
            FrameOutcome::Updated(summary) => {
                assert_eq!(summary.placements.len(), 2);
                assert_eq!(summary.tick.rendered, 2);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(frames.pending_markers().count(), 0);
        assert_eq!(fx.world.live_anchors(), 2);
        assert_eq!(fx.factory.find("A").map(|v| v.distance_text()).as_deref(), Some("56 m"));
    }

    #[test]
    fn test_hides_loading_on_tracked_plane() {
        let fx = fixture();
        let mut frames = frame_loop(&fx, SceneConfig::default());
        frames.request_assets(&fx.factory);
        fx.factory.complete_all();
        fx.world.set_tracking(TrackingState::Tracking);
        fx.loading.show();

        fx.world.detect_plane(TrackingState::Paused);
        frames.on_frame(fx.session.as_ref());
        assert!(fx.ui.loading_visible());

        fx.world.detect_plane(TrackingState::Tracking);
        match frames.on_frame(fx.session.as_ref()) {
            FrameOutcome::Updated(summary) => assert!(summary.loading_hidden),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!fx.ui.loading_visible());
        assert_eq!(fx.ui.hides(), 1);
    }

    #[test]
    fn test_periodic_refresh() {
        let fx = fixture();
        let config = SceneConfig {
            refresh_interval_frames: Some(2),
            ..Default::default()
        };
        let mut frames = frame_loop(&fx, config);
        frames.request_assets(&fx.factory);
        fx.factory.complete_all();
        fx.world.set_tracking(TrackingState::Tracking);

        let refreshed: Vec<usize> = (0..4)
            .map(|_| match frames.on_frame(fx.session.as_ref()) {
                FrameOutcome::Updated(summary) => summary.refreshed,
                _ => usize::MAX,
            })
            .collect();
        assert_eq!(refreshed, vec![0, 2, 0, 2]);
        assert_eq!(fx.world.live_anchors(), 2);
    }

    #[test]
    fn test_teardown_releases() {
        let fx = fixture();
        let mut frames = frame_loop(&fx, SceneConfig::default());
        frames.request_assets(&fx.factory);
        fx.factory.complete_all();
        fx.world.set_tracking(TrackingState::Tracking);
        frames.on_frame(fx.session.as_ref());
        assert_eq!(fx.world.live_anchors(), 2);

        frames.teardown();
        assert_eq!(fx.world.live_anchors(), 0);
        assert_eq!(frames.on_frame(fx.session.as_ref()), FrameOutcome::Released);
    }

    #[test]
    fn test_rejects_zero_refresh_interval() {
        let fx = fixture();
        let config = SceneConfig {
            refresh_interval_frames: Some(0),
            ..Default::default()
        };
        let result = FrameUpdateLoop::new(markers(), config, Box::new(fx.world.geo_sensor()), fx.loading.clone());
        assert!(matches!(result, Err(SceneError::Config(_))));
    }

    #[test]
    fn test_failed_placement_retried_next_frame() {
        let fx = fixture();
        let mut frames = frame_loop(&fx, SceneConfig::default());
        frames.request_assets(&fx.factory);
        fx.factory.complete_all();
        fx.world.set_tracking(TrackingState::Tracking);
        fx.world.set_anchor_limit(Some(1));

        match frames.on_frame(fx.session.as_ref()) {
            FrameOutcome::Updated(summary) => assert_eq!(summary.placements.len(), 1),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(frames.pending_markers().count(), 1);
        assert_eq!(frames.scene().map(AnchorScene::len), Some(1));

        fx.world.set_anchor_limit(None);
        frames.on_frame(fx.session.as_ref());
        assert_eq!(frames.pending_markers().count(), 0);
        assert_eq!(frames.scene().map(AnchorScene::len), Some(2));
        assert_eq!(fx.world.live_anchors(), 2);
    }
}
