//! Spatial anchors
//!
//! An [`Anchor`] is the single owner of one native anchor. It is not
//! `Clone`; the native resource is released exactly once, either through
//! [`Anchor::release`] or when the handle is dropped.

use crate::error::Result;
use crate::Pose;
use locar_core::Id;
use std::fmt;
use std::sync::Arc;

/// Anchor identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub Id);

impl AnchorId {
    pub fn new(id: u64) -> Self {
        Self(Id::new(id))
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anchor:{}", self.0)
    }
}

/// Native anchor allocation, provided by the AR session
pub trait AnchorStore: Send + Sync {
    /// Create an anchor fixed at `pose`
    fn create_anchor(&self, pose: Pose) -> Result<AnchorId>;

    /// Stop tracking and free the anchor
    fn destroy_anchor(&self, id: AnchorId) -> Result<()>;

    /// Number of anchors currently alive in the store
    fn live_anchors(&self) -> usize;
}

/// Owning handle for one native anchor
pub struct Anchor {
    id: AnchorId,
    pose: Pose,
    store: Arc<dyn AnchorStore>,
    released: bool,
}

impl Anchor {
    /// Allocate a new anchor at `pose`
    pub fn create(store: &Arc<dyn AnchorStore>, pose: Pose) -> Result<Self> {
        let id = store.create_anchor(pose)?;
        Ok(Self {
            id,
            pose,
            store: Arc::clone(store),
            released: false,
        })
    }

    #[inline]
    pub fn id(&self) -> AnchorId {
        self.id
    }

    #[inline]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Release the native anchor now, reporting failures
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.store.destroy_anchor(self.id)
    }
}

impl fmt::Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anchor")
            .field("id", &self.id)
            .field("pose", &self.pose)
            .finish()
    }
}

impl Drop for Anchor {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.store.destroy_anchor(self.id) {
                log::warn!("Failed to release {} on drop: {}", self.id, e);
            }
        }
    }
}
