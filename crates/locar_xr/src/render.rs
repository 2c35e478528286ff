//! Renderable label views and UI signals
//!
//! The view layer is owned by the host app. The engine only sees opaque
//! [`RenderableAsset`] handles and pushes text into them through callbacks.

use crate::error::{Result, XrError};
use std::sync::Arc;

/// Describes which view to inflate for a marker
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewDescriptor {
    /// Layout resource name
    pub layout: String,
    /// Title text written into the view once built
    pub title: String,
}

impl ViewDescriptor {
    pub fn new(layout: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            layout: layout.into(),
            title: title.into(),
        }
    }
}

/// A built view bound to one marker
pub trait RenderableAsset: Send + Sync {
    /// Descriptor the view was built from
    fn descriptor(&self) -> &ViewDescriptor;

    /// Replace the secondary (distance) text of the view
    fn set_distance_text(&self, text: &str);
}

/// Completion callback for an asynchronous build
pub type RenderableCallback = Box<dyn FnOnce(Result<Arc<dyn RenderableAsset>>) + Send>;

/// Builds renderables asynchronously
///
/// Completions may run on any thread, in any order, possibly before
/// `build` returns.
pub trait RenderableFactory {
    fn build(&self, descriptor: ViewDescriptor, on_ready: RenderableCallback);
}

/// Fire-and-forget UI chrome signals
pub trait UiSignals: Send + Sync {
    /// Show the "looking for surfaces" indicator (idempotent)
    fn show_loading(&self);

    /// Hide the indicator (idempotent)
    fn hide_loading(&self);

    /// Surface an unrecoverable error to the user
    fn fatal_error(&self, error: &XrError);
}
