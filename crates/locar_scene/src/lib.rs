//! # locar_scene - Geo Marker Anchoring
//!
//! Maps a bounded catalog of geo-tagged markers onto live AR anchors and
//! keeps their distance labels current as the device moves.
//!
//! ## Architecture
//!
//! ```text
//! LocarApp
//! ├── SessionLifecycle   resume / pause / destroy, owns the ArSession
//! └── FrameUpdateLoop    per-frame pipeline
//!     ├── AssetLatch     waits for every marker view to build
//!     └── AnchorScene    bounded, ordered AnchorRecords
//!         └── AnchorRecord = GeoMarker + Anchor + weak RenderableAsset
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use locar_scene::prelude::*;
//!
//! let mut app = LocarApp::new(markers, SceneConfig::default(), provider, sensor, ui)?;
//! app.on_create(&factory);
//! app.on_resume();
//! loop {
//!     match app.on_update() {
//!         FrameOutcome::Updated(summary) => log::trace!("{:?}", summary.tick),
//!         FrameOutcome::Released => break,
//!         _ => {}
//!     }
//! }
//! ```

pub mod app;
pub mod assets;
pub mod catalog;
pub mod config;
pub mod error;
pub mod frame_loop;
pub mod lifecycle;
pub mod loading;
pub mod marker;
pub mod record;
pub mod scene;

pub use app::LocarApp;
pub use assets::{AssetLatch, LatchStats, LoadedAsset};
pub use catalog::{parse_catalog, sample_markers, validate_markers};
pub use config::SceneConfig;
pub use error::{Result, SceneError};
pub use frame_loop::{FrameOutcome, FrameSummary, FrameUpdateLoop, SceneSlot};
pub use lifecycle::{LifecycleState, ResumeOutcome, SessionLifecycle};
pub use loading::LoadingIndicator;
pub use marker::{GeoMarker, MarkerCategory, MarkerIdentity};
pub use record::{AnchorRecord, RecordId, RecordState, RenderCallback, RenderEvent};
pub use scene::{AnchorScene, Placement, TickReport};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::{
        AnchorRecord, AnchorScene, FrameOutcome, FrameUpdateLoop, GeoMarker, LocarApp,
        MarkerCategory, Placement, RecordId, RecordState, RenderEvent, SceneConfig, SceneError,
        SessionLifecycle,
    };
}
