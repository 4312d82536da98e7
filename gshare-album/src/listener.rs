//! Transfer lifecycle callbacks
//!
//! A transfer produces `on_start` only after permission is granted, then
//! exactly one terminal callback: `on_denied`, `on_skipped` or `on_end`.
//! Callbacks run on the transfer task, never on the caller's task. A
//! panicking callback is caught and logged; the transfer result stands.

use crate::error::TransferError;
use crate::models::TransferResult;
use gshare_common::events::{EventBus, ShareEvent};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use tracing::error;

/// Observer of one session's transfers; all methods default to no-ops
pub trait ShareListener: Send + Sync {
    /// Permission granted, worker about to start
    fn on_start(&self, _path: &Path) {}

    /// Permission denied; nothing was written
    fn on_denied(&self, _path: &Path) {}

    /// Display name already indexed; nothing was written
    fn on_skipped(&self, _path: &Path) {}

    /// Worker finished; `error` is `None` on success
    fn on_end(&self, _error: Option<&TransferError>, _path: &Path) {}
}

/// Listener installed when the caller registers none
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl ShareListener for NoopListener {}

/// Run one listener callback, containing a panic inside it
pub(crate) fn guarded(callback: &'static str, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        error!(callback, "Share listener panicked");
    }
}

/// Route a terminal result to exactly one listener callback
pub(crate) fn deliver_terminal(listener: &dyn ShareListener, result: &TransferResult) {
    match result {
        TransferResult::Success(path) => guarded("on_end", || listener.on_end(None, path)),
        TransferResult::Denied(path) => guarded("on_denied", || listener.on_denied(path)),
        TransferResult::Skipped(path) => guarded("on_skipped", || listener.on_skipped(path)),
        TransferResult::Failed(path, error) => {
            guarded("on_end", || listener.on_end(Some(error), path))
        }
    }
}

/// Mirrors every callback onto an [`EventBus`] as a [`ShareEvent`]
#[derive(Clone)]
pub struct EventBusListener {
    bus: EventBus,
}

impl EventBusListener {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl ShareListener for EventBusListener {
    fn on_start(&self, path: &Path) {
        self.bus.emit_lossy(ShareEvent::TransferStarted {
            path: path_string(path),
            timestamp: gshare_common::time::now(),
        });
    }

    fn on_denied(&self, path: &Path) {
        self.bus.emit_lossy(ShareEvent::TransferDenied {
            path: path_string(path),
            timestamp: gshare_common::time::now(),
        });
    }

    fn on_skipped(&self, path: &Path) {
        self.bus.emit_lossy(ShareEvent::TransferSkipped {
            path: path_string(path),
            timestamp: gshare_common::time::now(),
        });
    }

    fn on_end(&self, error: Option<&TransferError>, path: &Path) {
        self.bus.emit_lossy(ShareEvent::TransferEnded {
            path: path_string(path),
            error_kind: error.map(|e| e.kind().as_str().to_string()),
            error: error.map(|e| e.to_string()),
            timestamp: gshare_common::time::now(),
        });
    }
}
