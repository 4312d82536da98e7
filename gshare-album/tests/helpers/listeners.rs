//! Listener that records every callback

use gshare_album::{ShareListener, TransferError, TransferErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Start(PathBuf),
    Denied(PathBuf),
    Skipped(PathBuf),
    End(Option<TransferErrorKind>, PathBuf),
}

impl Callback {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Callback::Start(_))
    }
}

#[derive(Default)]
pub struct RecordingListener {
    calls: Mutex<Vec<Callback>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Callback> {
        self.calls.lock().unwrap().clone()
    }

    pub fn terminal_count(&self) -> usize {
        self.calls().iter().filter(|c| c.is_terminal()).count()
    }

    fn record(&self, callback: Callback) {
        self.calls.lock().unwrap().push(callback);
    }
}

impl ShareListener for RecordingListener {
    fn on_start(&self, path: &Path) {
        self.record(Callback::Start(path.to_path_buf()));
    }

    fn on_denied(&self, path: &Path) {
        self.record(Callback::Denied(path.to_path_buf()));
    }

    fn on_skipped(&self, path: &Path) {
        self.record(Callback::Skipped(path.to_path_buf()));
    }

    fn on_end(&self, error: Option<&TransferError>, path: &Path) {
        self.record(Callback::End(error.map(|e| e.kind()), path.to_path_buf()));
    }
}

/// Listener whose `on_start` panics; later callbacks are recorded
#[derive(Default)]
pub struct PanicOnStartListener {
    inner: RecordingListener,
}

impl PanicOnStartListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Callback> {
        self.inner.calls()
    }
}

impl ShareListener for PanicOnStartListener {
    fn on_start(&self, _path: &Path) {
        panic!("listener failed in on_start");
    }

    fn on_end(&self, error: Option<&TransferError>, path: &Path) {
        self.inner.on_end(error, path);
    }
}
