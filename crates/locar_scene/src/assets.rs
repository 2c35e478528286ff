//! Asynchronous renderable loading
//!
//! One label view is built per catalog marker. Builds complete on whatever
//! thread the factory uses; [`AssetLatch`] collects them behind a mutex and
//! opens once every build has reported, successfully or not.

use crate::marker::GeoMarker;
use locar_xr::{RenderableAsset, RenderableCallback, RenderableFactory, ViewDescriptor, XrError};
use parking_lot::Mutex;
use std::sync::Arc;

/// A renderable built for a marker
#[derive(Clone)]
pub struct LoadedAsset {
    pub marker: GeoMarker,
    pub renderable: Arc<dyn RenderableAsset>,
}

impl std::fmt::Debug for LoadedAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedAsset")
            .field("marker", &self.marker)
            .field("renderable", &self.renderable.descriptor())
            .finish()
    }
}

/// Latch progress
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LatchStats {
    pub requested: usize,
    pub loaded: usize,
    pub failed: usize,
}

impl LatchStats {
    pub fn remaining(&self) -> usize {
        self.requested - self.loaded - self.failed
    }
}

struct LatchState {
    slots: Vec<Option<LoadedAsset>>,
    stats: LatchStats,
    reported: Vec<bool>,
    taken: bool,
}

/// Counting completion latch over pending renderable builds
#[derive(Clone)]
pub struct AssetLatch {
    state: Arc<Mutex<LatchState>>,
}

impl AssetLatch {
    /// Latch expecting `count` completions
    pub fn new(count: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(LatchState {
                slots: (0..count).map(|_| None).collect(),
                stats: LatchStats {
                    requested: count,
                    ..Default::default()
                },
                reported: vec![false; count],
                taken: false,
            })),
        }
    }

    /// Record the outcome of build `index`
    ///
    /// Duplicate or out-of-range reports are ignored.
    pub fn complete(
        &self,
        index: usize,
        marker: GeoMarker,
        result: locar_xr::Result<Arc<dyn RenderableAsset>>,
    ) {
        let mut state = self.state.lock();
        if state.reported.get(index).copied() != Some(false) {
            log::warn!("Ignoring unexpected completion #{} for '{}'", index, marker.title());
            return;
        }
        state.reported[index] = true;

        match result {
            Ok(renderable) => {
                state.slots[index] = Some(LoadedAsset { marker, renderable });
                state.stats.loaded += 1;
            }
            Err(e) => {
                log::warn!("Unable to load renderable for '{}': {}", marker.title(), e);
                state.stats.failed += 1;
            }
        }

        if state.stats.remaining() == 0 {
            log::info!(
                "All renderables resolved ({} loaded, {} failed)",
                state.stats.loaded,
                state.stats.failed
            );
        }
    }

    pub fn stats(&self) -> LatchStats {
        self.state.lock().stats
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().stats.remaining() == 0
    }

    /// Take the loaded assets once every build has reported
    ///
    /// Returns `Some` exactly once, in catalog order; failed builds are
    /// absent.
    pub fn take_if_ready(&self) -> Option<Vec<LoadedAsset>> {
        let mut state = self.state.lock();
        if state.taken || state.stats.remaining() > 0 {
            return None;
        }
        state.taken = true;
        Some(state.slots.iter_mut().filter_map(Option::take).collect())
    }
}

/// Start one build per marker, each reporting into `latch`
pub fn request_renderables(
    factory: &dyn RenderableFactory,
    markers: &[GeoMarker],
    layout: &str,
    latch: &AssetLatch,
) {
    for (index, marker) in markers.iter().enumerate() {
        let descriptor = ViewDescriptor::new(layout, marker.title());
        let latch = latch.clone();
        let marker = marker.clone();
        let on_ready: RenderableCallback = Box::new(move |result: Result<Arc<dyn RenderableAsset>, XrError>| {
            latch.complete(index, marker, result);
        });
        factory.build(descriptor, on_ready);
    }
    log::debug!("Requested {} renderables", markers.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::MarkerCategory;
    use locar_xr::sim::{BuildMode, SimRenderableFactory};

    fn markers() -> Vec<GeoMarker> {
        vec![
            GeoMarker::new(51.5, -0.1, "A", MarkerCategory::Other),
            GeoMarker::new(51.6, -0.2, "B", MarkerCategory::Other),
            GeoMarker::new(51.7, -0.3, "C", MarkerCategory::Other),
        ]
    }

    #[test]
    fn test_opens_after_every_completion() {
        let factory = SimRenderableFactory::new(BuildMode::Deferred);
        let latch = AssetLatch::new(3);
        request_renderables(&factory, &markers(), "example_layout", &latch);
        assert_eq!(factory.pending(), 3);

        factory.complete_next();
        factory.fail_next("missing layout");
        assert!(!latch.is_ready());
        assert!(latch.take_if_ready().is_none());

        factory.complete_next();
        assert!(latch.is_ready());
        assert_eq!(
            latch.stats(),
            LatchStats {
                requested: 3,
                loaded: 2,
                failed: 1
            }
        );

        let assets = latch.take_if_ready().unwrap();
        let titles: Vec<_> = assets.iter().map(|a| a.marker.title()).collect();
        assert_eq!(titles, vec!["A", "C"]);
        assert!(latch.take_if_ready().is_none());
    }

    #[test]
    fn test_duplicate_completion_ignored() {
        let latch = AssetLatch::new(2);
        let marker = markers().remove(0);
        latch.complete(0, marker.clone(), Err(XrError::AssetFailed("x".into())));
        latch.complete(0, marker.clone(), Err(XrError::AssetFailed("x".into())));
        latch.complete(7, marker, Err(XrError::AssetFailed("x".into())));
        assert_eq!(latch.stats().remaining(), 1);
    }

    #[test]
    fn test_threaded_completions() {
        let factory = SimRenderableFactory::new(BuildMode::Threaded);
        let latch = AssetLatch::new(3);
        request_renderables(&factory, &markers(), "example_layout", &latch);

        let mut spins = 0;
        while !latch.is_ready() && spins < 1000 {
            std::thread::sleep(std::time::Duration::from_millis(1));
            spins += 1;
        }
        assert_eq!(latch.take_if_ready().map(|a| a.len()), Some(3));
    }

    #[test]
    fn test_empty_catalog_is_ready() {
        let latch = AssetLatch::new(0);
        assert!(latch.is_ready());
        assert_eq!(latch.take_if_ready().map(|a| a.len()), Some(0));
    }
}
