//! Scripted in-process AR backend
//!
//! [`SimWorld`] owns the simulated device: camera pose, tracking state,
//! detected planes, GPS fix and the anchor table. Every collaborator trait is
//! implemented by a small handle sharing that state, so a test or demo can
//! drive the world while the engine talks to the handles.
//!
//! ```ignore
//! let world = SimWorld::new(GeoFix::new(GeoCoord::new(51.5, -0.1), 0.0));
//! let provider = world.session_provider();
//! let sensor = world.geo_sensor();
//! world.set_tracking(TrackingState::Tracking);
//! world.translate_camera(Vec3d::new(0.0, 0.0, 2.0));
//! ```

use crate::anchor::{AnchorId, AnchorStore};
use crate::error::{Result, XrError};
use crate::render::{RenderableAsset, RenderableCallback, RenderableFactory, UiSignals, ViewDescriptor};
use crate::sensor::{GeoFix, GeoSensor};
use crate::session::{ArSession, SessionProvider, SessionState};
use crate::{Frame, Plane, PlaneId, Pose, TrackingProvider, TrackingState};
use locar_core::IdGenerator;
use locar_math::Vec3d;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Nominal frame period (60 Hz)
const FRAME_PERIOD_NS: u64 = 16_666_667;

struct SimState {
    camera: Pose,
    tracking: TrackingState,
    pending_planes: Vec<Plane>,
    frame_index: u64,
    session: SessionState,
    camera_fails: bool,
    fix: Option<GeoFix>,
    sensor_running: bool,
    anchors: BTreeMap<AnchorId, Pose>,
    next_anchor: u64,
    anchor_limit: Option<usize>,
    ar_supported: bool,
    permissions: bool,
    install_prompts: u32,
    sessions_created: u32,
}

/// Shared simulated device and world
#[derive(Clone)]
pub struct SimWorld {
    state: Arc<Mutex<SimState>>,
    plane_ids: Arc<IdGenerator>,
}

impl SimWorld {
    /// A supported device standing at `fix`, permissions granted, not tracking yet
    pub fn new(fix: GeoFix) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                camera: Pose::default(),
                tracking: TrackingState::NotTracking,
                pending_planes: Vec::new(),
                frame_index: 0,
                session: SessionState::Idle,
                camera_fails: false,
                fix: Some(fix),
                sensor_running: false,
                anchors: BTreeMap::new(),
                next_anchor: 0,
                anchor_limit: None,
                ar_supported: true,
                permissions: true,
                install_prompts: 0,
                sessions_created: 0,
            })),
            plane_ids: Arc::new(IdGenerator::new()),
        }
    }

    pub fn session_provider(&self) -> SimSessionProvider {
        SimSessionProvider { world: self.clone() }
    }

    pub fn geo_sensor(&self) -> SimGeoSensor {
        SimGeoSensor { world: self.clone() }
    }

    /// Anchor store bound to this world, usable without a session
    pub fn anchor_store(&self) -> Arc<dyn AnchorStore> {
        Arc::new(SimAnchorStore { world: self.clone() })
    }

    pub fn set_tracking(&self, tracking: TrackingState) {
        self.state.lock().tracking = tracking;
    }

    pub fn translate_camera(&self, delta: Vec3d) {
        let mut state = self.state.lock();
        state.camera = state.camera.translated(delta);
    }

    pub fn camera(&self) -> Pose {
        self.state.lock().camera
    }

    /// Replace the GPS/compass fix (`None` simulates no fix yet)
    pub fn set_fix(&self, fix: Option<GeoFix>) {
        self.state.lock().fix = fix;
    }

    /// Report a plane in the next frame's updated set
    pub fn detect_plane(&self, tracking_state: TrackingState) -> PlaneId {
        let id = PlaneId(self.plane_ids.next());
        let mut state = self.state.lock();
        let center = state.camera.translated(Vec3d::new(0.0, -1.4, -1.0));
        state.pending_planes.push(Plane {
            id,
            center,
            extent: [1.5, 1.5],
            tracking_state,
        });
        id
    }

    /// Make the next session resume fail with `CameraUnavailable`
    pub fn fail_camera(&self, fails: bool) {
        self.state.lock().camera_fails = fails;
    }

    pub fn set_permissions(&self, granted: bool) {
        self.state.lock().permissions = granted;
    }

    pub fn set_ar_supported(&self, supported: bool) {
        self.state.lock().ar_supported = supported;
    }

    /// The next `count` session creations ask for an install step first
    pub fn require_install(&self, count: u32) {
        self.state.lock().install_prompts = count;
    }

    /// Cap the number of simultaneously live anchors
    pub fn set_anchor_limit(&self, limit: Option<usize>) {
        self.state.lock().anchor_limit = limit;
    }

    pub fn live_anchors(&self) -> usize {
        self.state.lock().anchors.len()
    }

    pub fn anchor_pose(&self, id: AnchorId) -> Option<Pose> {
        self.state.lock().anchors.get(&id).copied()
    }

    pub fn session_state(&self) -> SessionState {
        self.state.lock().session
    }

    pub fn sessions_created(&self) -> u32 {
        self.state.lock().sessions_created
    }

    pub fn sensor_running(&self) -> bool {
        self.state.lock().sensor_running
    }
}

/// Session provider backed by a [`SimWorld`]
pub struct SimSessionProvider {
    world: SimWorld,
}

impl SessionProvider for SimSessionProvider {
    fn create_session(&mut self, install_requested: bool) -> Result<Option<Box<dyn ArSession>>> {
        let mut state = self.world.state.lock();
        if !state.ar_supported {
            return Err(XrError::SessionUnavailable("AR is not supported on this device".into()));
        }
        if state.install_prompts > 0 {
            state.install_prompts -= 1;
            log::debug!("Simulated install prompt (install_requested={})", install_requested);
            return Ok(None);
        }
        if !state.permissions {
            return Ok(None);
        }

        state.sessions_created += 1;
        state.session = SessionState::Idle;
        drop(state);

        Ok(Some(Box::new(SimSession {
            world: self.world.clone(),
            store: self.world.anchor_store(),
        })))
    }

    fn has_permissions(&self) -> bool {
        self.world.state.lock().permissions
    }
}

/// Session handle backed by a [`SimWorld`]
pub struct SimSession {
    world: SimWorld,
    store: Arc<dyn AnchorStore>,
}

impl TrackingProvider for SimSession {
    fn current_frame(&self) -> Option<Frame> {
        let mut state = self.world.state.lock();
        if state.session != SessionState::Running {
            return None;
        }

        state.frame_index += 1;
        Some(Frame {
            timestamp_ns: state.frame_index * FRAME_PERIOD_NS,
            camera: state.camera,
            tracking_state: state.tracking,
            updated_planes: std::mem::take(&mut state.pending_planes),
        })
    }
}

impl ArSession for SimSession {
    fn resume(&mut self) -> Result<()> {
        let mut state = self.world.state.lock();
        if state.session == SessionState::Destroyed {
            return Err(XrError::SessionUnavailable("session was destroyed".into()));
        }
        if state.camera_fails {
            return Err(XrError::CameraUnavailable("camera is in use by another app".into()));
        }
        state.session = SessionState::Running;
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = self.world.state.lock();
        if state.session == SessionState::Running {
            state.session = SessionState::Paused;
        }
    }

    fn destroy(&mut self) {
        let mut state = self.world.state.lock();
        state.session = SessionState::Destroyed;
        state.anchors.clear();
    }

    fn state(&self) -> SessionState {
        self.world.state.lock().session
    }

    fn anchor_store(&self) -> Arc<dyn AnchorStore> {
        Arc::clone(&self.store)
    }
}

/// Anchor table backed by a [`SimWorld`]
pub struct SimAnchorStore {
    world: SimWorld,
}

impl AnchorStore for SimAnchorStore {
    fn create_anchor(&self, pose: Pose) -> Result<AnchorId> {
        let mut state = self.world.state.lock();
        if !state.tracking.is_tracking() {
            return Err(XrError::NotTracking);
        }
        if let Some(limit) = state.anchor_limit {
            if state.anchors.len() >= limit {
                return Err(XrError::AnchorFailed(format!("anchor limit {} reached", limit)));
            }
        }

        let id = AnchorId::new(state.next_anchor);
        state.next_anchor += 1;
        state.anchors.insert(id, pose);
        Ok(id)
    }

    fn destroy_anchor(&self, id: AnchorId) -> Result<()> {
        match self.world.state.lock().anchors.remove(&id) {
            Some(_) => Ok(()),
            None => Err(XrError::AnchorFailed(format!("{} is not live", id))),
        }
    }

    fn live_anchors(&self) -> usize {
        self.world.state.lock().anchors.len()
    }
}

/// GPS/compass sensor backed by a [`SimWorld`]
pub struct SimGeoSensor {
    world: SimWorld,
}

impl GeoSensor for SimGeoSensor {
    fn resume(&mut self) {
        self.world.state.lock().sensor_running = true;
    }

    fn pause(&mut self) {
        self.world.state.lock().sensor_running = false;
    }

    fn is_running(&self) -> bool {
        self.world.state.lock().sensor_running
    }

    fn latest_fix(&self) -> Option<GeoFix> {
        self.world.state.lock().fix
    }
}

/// A built label view that remembers the last text pushed into it
pub struct SimRenderable {
    descriptor: ViewDescriptor,
    distance_text: Mutex<String>,
    updates: AtomicUsize,
}

impl SimRenderable {
    pub fn new(descriptor: ViewDescriptor) -> Self {
        Self {
            descriptor,
            distance_text: Mutex::new(String::new()),
            updates: AtomicUsize::new(0),
        }
    }

    pub fn distance_text(&self) -> String {
        self.distance_text.lock().clone()
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::Relaxed)
    }
}

impl RenderableAsset for SimRenderable {
    fn descriptor(&self) -> &ViewDescriptor {
        &self.descriptor
    }

    fn set_distance_text(&self, text: &str) {
        *self.distance_text.lock() = text.to_string();
        self.updates.fetch_add(1, Ordering::Relaxed);
    }
}

/// When a [`SimRenderableFactory`] completes its builds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildMode {
    /// Complete inside `build`
    Immediate,
    /// Hold builds until [`SimRenderableFactory::complete_next`] / `complete_all`
    Deferred,
    /// Complete on a freshly spawned thread
    Threaded,
}

/// Renderable factory producing [`SimRenderable`]s
pub struct SimRenderableFactory {
    mode: BuildMode,
    queue: Mutex<VecDeque<(ViewDescriptor, RenderableCallback)>>,
    built: Mutex<Vec<Arc<SimRenderable>>>,
}

impl SimRenderableFactory {
    pub fn new(mode: BuildMode) -> Self {
        Self {
            mode,
            queue: Mutex::new(VecDeque::new()),
            built: Mutex::new(Vec::new()),
        }
    }

    /// Builds waiting for completion (deferred mode)
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Complete the oldest deferred build successfully
    pub fn complete_next(&self) -> bool {
        let next = self.queue.lock().pop_front();
        match next {
            Some((descriptor, on_ready)) => {
                on_ready(Ok(self.make(descriptor)));
                true
            }
            None => false,
        }
    }

    /// Fail the oldest deferred build
    pub fn fail_next(&self, reason: &str) -> bool {
        let next = self.queue.lock().pop_front();
        match next {
            Some((descriptor, on_ready)) => {
                on_ready(Err(XrError::AssetFailed(format!("{}: {}", descriptor.title, reason))));
                true
            }
            None => false,
        }
    }

    /// Complete every deferred build; returns how many completed
    pub fn complete_all(&self) -> usize {
        let mut count = 0;
        while self.complete_next() {
            count += 1;
        }
        count
    }

    /// Every renderable built so far, in completion order
    pub fn built(&self) -> Vec<Arc<SimRenderable>> {
        self.built.lock().clone()
    }

    /// Renderable built for `title`, if any
    pub fn find(&self, title: &str) -> Option<Arc<SimRenderable>> {
        self.built
            .lock()
            .iter()
            .find(|r| r.descriptor.title == title)
            .cloned()
    }

    fn make(&self, descriptor: ViewDescriptor) -> Arc<dyn RenderableAsset> {
        let renderable = Arc::new(SimRenderable::new(descriptor));
        self.built.lock().push(Arc::clone(&renderable));
        renderable
    }
}

impl RenderableFactory for SimRenderableFactory {
    fn build(&self, descriptor: ViewDescriptor, on_ready: RenderableCallback) {
        match self.mode {
            BuildMode::Immediate => on_ready(Ok(self.make(descriptor))),
            BuildMode::Deferred => self.queue.lock().push_back((descriptor, on_ready)),
            BuildMode::Threaded => {
                let renderable = self.make(descriptor);
                std::thread::spawn(move || on_ready(Ok(renderable)));
            }
        }
    }
}

/// UI sink that records every signal
#[derive(Default)]
pub struct RecordingUi {
    loading_visible: AtomicBool,
    shows: AtomicUsize,
    hides: AtomicUsize,
    fatal: Mutex<Vec<XrError>>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loading_visible(&self) -> bool {
        self.loading_visible.load(Ordering::Relaxed)
    }

    pub fn shows(&self) -> usize {
        self.shows.load(Ordering::Relaxed)
    }

    pub fn hides(&self) -> usize {
        self.hides.load(Ordering::Relaxed)
    }

    pub fn fatal_errors(&self) -> Vec<XrError> {
        self.fatal.lock().clone()
    }
}

impl UiSignals for RecordingUi {
    fn show_loading(&self) {
        self.shows.fetch_add(1, Ordering::Relaxed);
        self.loading_visible.store(true, Ordering::Relaxed);
    }

    fn hide_loading(&self) {
        self.hides.fetch_add(1, Ordering::Relaxed);
        self.loading_visible.store(false, Ordering::Relaxed);
    }

    fn fatal_error(&self, error: &XrError) {
        log::error!("Fatal: {}", error);
        self.fatal.lock().push(error.clone());
    }
}
