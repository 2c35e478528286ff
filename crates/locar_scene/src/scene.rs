//! The anchor scene: a bounded, ordered set of live anchor records
//!
//! Records are kept in insertion order. The scene never holds more records
//! than its capacity, which is fixed when the scene is built (one slot per
//! catalog marker).
//!
//! ## Replacement policy
//!
//! | situation                                   | result                         |
//! |---------------------------------------------|--------------------------------|
//! | device not tracked                          | `Err(PoseUnavailable)`, no-op  |
//! | below capacity, same marker already active  | [`Placement::Retained`]        |
//! | below capacity                              | [`Placement::Inserted`]        |
//! | at capacity, same marker found              | [`Placement::Replaced`]        |
//! | at capacity, no match                       | [`Placement::Dropped`]         |
//!
//! Replacing re-anchors every other record against the same device fix, so
//! the whole scene stays consistent with the latest location.

use crate::config::SceneConfig;
use crate::error::{Result, SceneError};
use crate::marker::GeoMarker;
use crate::record::{AnchorRecord, RecordId, RenderEvent};
use locar_core::{catch_panic_mut, IdGenerator};
use locar_xr::{AnchorStore, DevicePose, Frame, GeoFix, GeoSensor, RenderableAsset, TrackingState};
use std::sync::Arc;

/// Result of [`AnchorScene::add_or_replace`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// New record appended
    Inserted(RecordId),
    /// Marker already active; the existing record was kept
    Retained(RecordId),
    /// Record for the same marker evicted and recreated at the end
    Replaced { evicted: RecordId, inserted: RecordId },
    /// Scene full and no record for this marker
    Dropped,
}

impl Placement {
    /// Record now representing the marker, if any
    pub fn record(&self) -> Option<RecordId> {
        match *self {
            Placement::Inserted(id) | Placement::Retained(id) => Some(id),
            Placement::Replaced { inserted, .. } => Some(inserted),
            Placement::Dropped => None,
        }
    }

    /// True if a new record (and anchor) was created
    pub fn created_record(&self) -> bool {
        matches!(self, Placement::Inserted(_) | Placement::Replaced { .. })
    }
}

/// Per-tick statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Records whose distance was recomputed and delivered
    pub rendered: usize,
    /// Records that failed (error or panic) this tick
    pub failed: usize,
    /// Tick skipped because the camera was not tracking
    pub skipped: bool,
}

/// Bounded set of anchor records bound to one anchor store and geo sensor
pub struct AnchorScene {
    records: Vec<AnchorRecord>,
    capacity: usize,
    anchors: Arc<dyn AnchorStore>,
    sensor: Box<dyn GeoSensor>,
    config: SceneConfig,
    ids: IdGenerator,
    torn_down: bool,
}

impl AnchorScene {
    pub fn new(
        capacity: usize,
        anchors: Arc<dyn AnchorStore>,
        sensor: Box<dyn GeoSensor>,
        config: SceneConfig,
    ) -> Self {
        log::info!("Anchor scene created with capacity {}", capacity);
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
            anchors,
            sensor,
            config,
            ids: IdGenerator::new(),
            torn_down: false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_at_capacity(&self) -> bool {
        self.records.len() >= self.capacity
    }

    #[inline]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Records in insertion order
    pub fn records(&self) -> &[AnchorRecord] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&AnchorRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Register the per-frame callback of record `id`
    pub fn on_render_event<F>(&mut self, id: RecordId, callback: F) -> Result<()>
    where
        F: FnMut(&RenderEvent) + Send + 'static,
    {
        match self.records.iter_mut().find(|r| r.id() == id) {
            Some(record) => {
                record.on_render_event(callback);
                Ok(())
            }
            None => Err(SceneError::RecordDetached(id)),
        }
    }

    pub fn contains_identity(&self, marker: &GeoMarker) -> bool {
        self.records.iter().any(|r| r.marker().same_identity(marker))
    }

    /// Latest fix from the geo sensor
    pub fn latest_fix(&self) -> Option<GeoFix> {
        self.sensor.latest_fix()
    }

    /// Device pose for `frame`, aligned with the latest geo fix
    pub fn device_pose(&self, frame: &Frame) -> DevicePose {
        DevicePose::from_frame(frame, self.latest_fix())
    }

    /// Place `marker` following the replacement policy
    pub fn add_or_replace(
        &mut self,
        marker: GeoMarker,
        renderable: &Arc<dyn RenderableAsset>,
        device: &DevicePose,
    ) -> Result<Placement> {
        if !device.is_tracked() {
            return Err(SceneError::PoseUnavailable);
        }
        if self.torn_down {
            log::warn!("Scene torn down, dropping '{}'", marker.title());
            return Ok(Placement::Dropped);
        }

        if !self.is_at_capacity() {
            if let Some(existing) = self.records.iter().find(|r| r.marker().same_identity(&marker)) {
                log::debug!("'{}' already active as {}", marker.title(), existing.id());
                return Ok(Placement::Retained(existing.id()));
            }
            let id = self.insert(marker, renderable, device)?;
            return Ok(Placement::Inserted(id));
        }

        let Some(index) = self.records.iter().position(|r| r.marker().same_identity(&marker)) else {
            log::debug!(
                "Scene full ({}/{}), no record for '{}'; dropped",
                self.records.len(),
                self.capacity,
                marker.title()
            );
            return Ok(Placement::Dropped);
        };

        // New record first: a failed allocation leaves the scene as it was
        let mut record = self.create_record(marker, renderable, device)?;
        self.records[index].detach();
        let evicted_id = self.records.remove(index).id();

        record.activate();
        let inserted = record.id();
        self.records.push(record);
        log::debug!("Replaced {} with {}", evicted_id, inserted);

        self.refresh_where(device, |r| r.id() != inserted);

        Ok(Placement::Replaced {
            evicted: evicted_id,
            inserted,
        })
    }

    /// Recompute distances and notify every active record
    ///
    /// A no-op unless `tracking` is [`TrackingState::Tracking`]. Failures
    /// and callback panics are contained per record.
    pub fn tick(&mut self, device: &DevicePose, tracking: TrackingState) -> TickReport {
        let mut report = TickReport::default();
        if !tracking.is_tracking() {
            report.skipped = true;
            return report;
        }

        for record in self.records.iter_mut().filter(|r| r.is_active()) {
            match catch_panic_mut(|| record.render(device)) {
                Ok(Ok(_)) => report.rendered += 1,
                Ok(Err(e)) => {
                    log::warn!("Skipping '{}' this frame: {}", record.name(), e);
                    report.failed += 1;
                }
                Err(msg) => {
                    log::error!("Render callback for '{}' panicked: {}", record.name(), msg);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Re-anchor every active record against `device`
    ///
    /// Returns the number of records moved.
    pub fn refresh_anchors(&mut self, device: &DevicePose) -> usize {
        self.refresh_where(device, |_| true)
    }

    /// Detach and remove every record
    ///
    /// Returns the detached records. Only the first call does anything.
    pub fn teardown(&mut self) -> Vec<AnchorRecord> {
        if self.torn_down {
            log::debug!("Anchor scene already torn down");
            return Vec::new();
        }
        self.torn_down = true;

        for record in self.records.iter_mut() {
            record.detach();
        }
        let records: Vec<AnchorRecord> = self.records.drain(..).collect();
        self.sensor.pause();

        log::info!("Anchor scene torn down ({} records released)", records.len());
        records
    }

    /// Start location and compass updates
    pub fn resume(&mut self) {
        if self.torn_down {
            return;
        }
        self.sensor.resume();
        log::debug!("Geo sensor resumed");
    }

    /// Stop location and compass updates
    pub fn pause(&mut self) {
        self.sensor.pause();
        log::debug!("Geo sensor paused");
    }

    fn create_record(
        &self,
        marker: GeoMarker,
        renderable: &Arc<dyn RenderableAsset>,
        device: &DevicePose,
    ) -> Result<AnchorRecord> {
        let id = RecordId(self.ids.next());
        AnchorRecord::create(id, marker, renderable, device, &self.anchors, &self.config)
    }

    fn insert(
        &mut self,
        marker: GeoMarker,
        renderable: &Arc<dyn RenderableAsset>,
        device: &DevicePose,
    ) -> Result<RecordId> {
        let mut record = self.create_record(marker, renderable, device)?;
        record.activate();
        let id = record.id();
        log::debug!("Inserted {} ('{}')", id, record.name());
        self.records.push(record);
        Ok(id)
    }

    fn refresh_where(&mut self, device: &DevicePose, include: impl Fn(&AnchorRecord) -> bool) -> usize {
        let mut moved = 0;
        for record in self.records.iter_mut().filter(|r| r.is_active() && include(r)) {
            match record.reanchor(device, &self.anchors, &self.config) {
                Ok(()) => moved += 1,
                Err(e) => log::warn!("Failed to re-anchor '{}': {}", record.name(), e),
            }
        }
        moved
    }
}

impl Drop for AnchorScene {
    fn drop(&mut self) {
        if !self.torn_down {
            self.teardown();
        }
    }
}

impl std::fmt::Debug for AnchorScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnchorScene")
            .field("records", &self.records)
            .field("capacity", &self.capacity)
            .field("torn_down", &self.torn_down)
            .finish()
    }
}
