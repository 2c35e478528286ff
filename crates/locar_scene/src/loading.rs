//! Loading indicator shared by the lifecycle and the frame loop

use locar_xr::{UiSignals, XrError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Tracks whether the "looking for surfaces" indicator is on screen, so
/// show/hide reach the UI only on an actual change.
pub struct LoadingIndicator {
    ui: Arc<dyn UiSignals>,
    shown: AtomicBool,
}

impl LoadingIndicator {
    pub fn new(ui: Arc<dyn UiSignals>) -> Self {
        Self {
            ui,
            shown: AtomicBool::new(false),
        }
    }

    pub fn is_shown(&self) -> bool {
        self.shown.load(Ordering::Acquire)
    }

    pub fn show(&self) {
        if !self.shown.swap(true, Ordering::AcqRel) {
            self.ui.show_loading();
        }
    }

    pub fn hide(&self) {
        if self.shown.swap(false, Ordering::AcqRel) {
            self.ui.hide_loading();
        }
    }

    /// Report an unrecoverable error; the indicator is dismissed first
    pub fn fatal(&self, error: &XrError) {
        self.hide();
        log::error!("{}", error);
        self.ui.fatal_error(error);
    }
}
