//! Anchor records: one marker bound to one scene anchor
//!
//! ```text
//! Created ──activate──► Active ──detach──► Detached (terminal)
//!    └────────────────detach─────────────────┘
//! ```
//!
//! A record owns its anchor outright. The renderable is shared with the
//! view layer and held weakly; the record never keeps a view alive.

use crate::config::SceneConfig;
use crate::error::{Result, SceneError};
use crate::marker::GeoMarker;
use locar_core::Id;
use locar_math::{check_precision, PrecisionStatus};
use locar_xr::{Anchor, AnchorStore, DevicePose, Pose, RenderableAsset};
use std::fmt;
use std::sync::{Arc, Weak};

/// Record identifier, unique within a scene
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub Id);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record:{}", self.0)
    }
}

/// Record lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordState {
    /// Anchor allocated, not yet part of a scene
    Created,
    /// In the scene's active set, updated every frame
    Active,
    /// Anchor released; the record is inert
    Detached,
}

/// Per-frame data handed to render callbacks
#[derive(Clone, Debug, PartialEq)]
pub struct RenderEvent {
    pub record: RecordId,
    pub name: String,
    /// Distance between the device and the anchor, metres
    pub distance_m: f64,
}

impl RenderEvent {
    /// Distance label as shown in the marker view, e.g. `"42 m"`
    pub fn label(&self) -> String {
        format!("{} m", self.distance_m.round() as i64)
    }
}

/// Per-frame render callback
pub type RenderCallback = Box<dyn FnMut(&RenderEvent) + Send>;

/// Live binding between a marker, its anchor and its renderable
pub struct AnchorRecord {
    id: RecordId,
    marker: GeoMarker,
    name: String,
    state: RecordState,
    anchor: Option<Anchor>,
    renderable: Option<Weak<dyn RenderableAsset>>,
    callback: Option<RenderCallback>,
    last_distance: Option<f64>,
}

/// Scene-space pose for `marker` as seen from `device`
pub(crate) fn project_marker(
    marker: &GeoMarker,
    device: &DevicePose,
    config: &SceneConfig,
) -> Result<Pose> {
    let fix = match device.fix {
        Some(fix) if device.tracking.is_tracking() => fix,
        _ => return Err(SceneError::PoseUnavailable),
    };

    let offset = fix.coord.scene_offset_to(
        &marker.coord(),
        fix.heading_deg,
        config.anchor_height_m,
        config.projection,
    );

    match check_precision(offset) {
        PrecisionStatus::Good => {}
        status => log::warn!(
            "Marker '{}' is {:.0} m away ({:?}); label placement will be coarse",
            marker.title(),
            offset.length(),
            status
        ),
    }

    Ok(device.pose.translated(offset))
}

impl AnchorRecord {
    /// Project `marker` against the device fix and allocate its anchor
    pub fn create(
        id: RecordId,
        marker: GeoMarker,
        renderable: &Arc<dyn RenderableAsset>,
        device: &DevicePose,
        anchors: &Arc<dyn AnchorStore>,
        config: &SceneConfig,
    ) -> Result<Self> {
        let pose = project_marker(&marker, device, config)?;
        let anchor = Anchor::create(anchors, pose)?;

        log::debug!("Created {} for '{}' at {:?}", anchor.id(), marker.title(), pose.position);

        Ok(Self {
            id,
            name: marker.title().to_string(),
            marker,
            state: RecordState::Created,
            anchor: Some(anchor),
            renderable: Some(Arc::downgrade(renderable)),
            callback: None,
            last_distance: None,
        })
    }

    #[inline]
    pub fn id(&self) -> RecordId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn marker(&self) -> &GeoMarker {
        &self.marker
    }

    #[inline]
    pub fn state(&self) -> RecordState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == RecordState::Active
    }

    /// Anchor pose; `None` once detached
    pub fn anchor_pose(&self) -> Option<&Pose> {
        self.anchor.as_ref().map(Anchor::pose)
    }

    /// The bound renderable, if the view layer still holds it
    pub fn renderable(&self) -> Option<Arc<dyn RenderableAsset>> {
        self.renderable.as_ref().and_then(Weak::upgrade)
    }

    /// Distance computed by the most recent render
    pub fn last_distance(&self) -> Option<f64> {
        self.last_distance
    }

    /// Move into the active set
    pub(crate) fn activate(&mut self) {
        if self.state == RecordState::Created {
            self.state = RecordState::Active;
        }
    }

    /// Release the anchor and drop every external reference. Idempotent.
    pub fn detach(&mut self) {
        if self.state == RecordState::Detached {
            return;
        }
        self.state = RecordState::Detached;
        self.renderable = None;
        self.callback = None;

        if let Some(anchor) = self.anchor.take() {
            let anchor_id = anchor.id();
            if let Err(e) = anchor.release() {
                log::warn!("Failed to release {} of '{}': {}", anchor_id, self.name, e);
            }
        }
        log::debug!("Detached {} ('{}')", self.id, self.name);
    }

    /// Euclidean distance between the anchor and the device, metres
    pub fn current_distance(&self, device: &DevicePose) -> Result<f64> {
        match &self.anchor {
            Some(anchor) => Ok(anchor.pose().position.distance(device.position())),
            None => Err(SceneError::RecordDetached(self.id)),
        }
    }

    /// Register the per-frame callback, replacing any previous one
    pub fn on_render_event<F>(&mut self, callback: F)
    where
        F: FnMut(&RenderEvent) + Send + 'static,
    {
        if self.state == RecordState::Detached {
            log::debug!("Ignoring render callback for detached {}", self.id);
            return;
        }
        self.callback = Some(Box::new(callback));
    }

    /// Recompute the distance and push it to the view and the callback
    pub(crate) fn render(&mut self, device: &DevicePose) -> Result<RenderEvent> {
        if self.state != RecordState::Active {
            return Err(SceneError::RecordDetached(self.id));
        }
        let distance_m = self.current_distance(device)?;
        self.last_distance = Some(distance_m);

        let event = RenderEvent {
            record: self.id,
            name: self.name.clone(),
            distance_m,
        };

        if let Some(view) = self.renderable() {
            view.set_distance_text(&event.label());
        }
        if let Some(callback) = self.callback.as_mut() {
            callback(&event);
        }
        Ok(event)
    }

    /// Re-project against a fresh device fix
    ///
    /// The replacement anchor is allocated before the old one is released,
    /// so on error the record keeps its current anchor.
    pub fn reanchor(
        &mut self,
        device: &DevicePose,
        anchors: &Arc<dyn AnchorStore>,
        config: &SceneConfig,
    ) -> Result<()> {
        if self.state == RecordState::Detached {
            return Err(SceneError::RecordDetached(self.id));
        }
        let pose = project_marker(&self.marker, device, config)?;
        let anchor = Anchor::create(anchors, pose)?;

        if let Some(old) = self.anchor.replace(anchor) {
            let old_id = old.id();
            if let Err(e) = old.release() {
                log::warn!("Failed to release {} while re-anchoring '{}': {}", old_id, self.name, e);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for AnchorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnchorRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("anchor", &self.anchor)
            .field("last_distance", &self.last_distance)
            .finish()
    }
}
