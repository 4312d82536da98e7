//! In-memory media index

use super::record_for_scanned_file;
use crate::platform::{
    MediaColumn, MediaHandle, MediaIndex, MediaRecord, MediaWriter, ScanTarget,
};
use async_trait::async_trait;
use gshare_common::{Error, Result};
use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;
use tracing::{debug, warn};

struct Entry {
    handle: MediaHandle,
    record: MediaRecord,
    content: Arc<Mutex<Vec<u8>>>,
}

#[derive(Default)]
struct State {
    next_id: i64,
    entries: BTreeMap<i64, Entry>,
    scans: Vec<ScanTarget>,
}

/// Process-local media index
///
/// Scan notifications are recorded and applied synchronously. Failures can
/// be injected per operation.
#[derive(Default)]
pub struct InMemoryMediaIndex {
    state: Mutex<State>,
    fail_inserts: AtomicBool,
    fail_queries: AtomicBool,
    fail_writes: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryMediaIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every following insert
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Fail every following query
    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Hand out writers that fail on the first write
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// All entries in insertion order
    pub fn records(&self) -> Vec<(MediaHandle, MediaRecord)> {
        lock(&self.state)
            .entries
            .values()
            .map(|entry| (entry.handle.clone(), entry.record.clone()))
            .collect()
    }

    /// Content written for an entry
    pub fn content(&self, handle: &MediaHandle) -> Option<Vec<u8>> {
        let state = lock(&self.state);
        let entry = state.entries.get(&handle.media_id()?)?;
        let content = lock(&entry.content).clone();
        Some(content)
    }

    /// Scan notifications in arrival order
    pub fn scans(&self) -> Vec<ScanTarget> {
        lock(&self.state).scans.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn add_entry(state: &mut State, record: MediaRecord) -> MediaHandle {
        state.next_id += 1;
        let id = state.next_id;
        let handle = MediaHandle::for_id(id);
        state.entries.insert(
            id,
            Entry {
                handle: handle.clone(),
                record,
                content: Arc::new(Mutex::new(Vec::new())),
            },
        );
        handle
    }
}

#[async_trait]
impl MediaIndex for InMemoryMediaIndex {
    async fn insert(&self, record: &MediaRecord) -> Result<MediaHandle> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(Error::Internal("insert rejected by index".to_string()));
        }

        let handle = Self::add_entry(&mut lock(&self.state), record.clone());
        debug!(handle = %handle, display_name = %record.display_name, "Indexed entry");
        Ok(handle)
    }

    async fn open_write(&self, handle: &MediaHandle) -> Result<MediaWriter> {
        let state = lock(&self.state);
        let entry = handle
            .media_id()
            .and_then(|id| state.entries.get(&id))
            .ok_or_else(|| Error::NotFound(handle.to_string()))?;

        if self.fail_writes.load(Ordering::SeqCst) {
            return Ok(Box::new(FailingWriter));
        }

        lock(&entry.content).clear();
        Ok(Box::new(SharedBufferWriter {
            buffer: Arc::clone(&entry.content),
        }))
    }

    async fn query(&self, column: MediaColumn, value: &str) -> Result<Vec<MediaHandle>> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(Error::Internal("query failed".to_string()));
        }

        Ok(lock(&self.state)
            .entries
            .values()
            .filter(|entry| column.value_of(&entry.record) == value)
            .map(|entry| entry.handle.clone())
            .collect())
    }

    async fn delete(&self, handle: &MediaHandle) -> Result<()> {
        let removed = handle
            .media_id()
            .and_then(|id| lock(&self.state).entries.remove(&id));
        match removed {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(handle.to_string())),
        }
    }

    fn notify_scanned(&self, target: ScanTarget) {
        let mut state = lock(&self.state);
        state.scans.push(target.clone());

        let ScanTarget::File(path) = target else {
            return;
        };

        let known = state
            .entries
            .values()
            .any(|entry| entry.record.data_path == path);
        if known {
            return;
        }

        match record_for_scanned_file(&path) {
            Ok(record) => {
                let handle = Self::add_entry(&mut state, record);
                debug!(handle = %handle, path = %path.display(), "Indexed scanned file");
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Scan found nothing to index"),
        }
    }
}

/// Appends into an entry's shared content buffer
struct SharedBufferWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl AsyncWrite for SharedBufferWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        lock(&self.buffer).extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

struct FailingWriter;

impl AsyncWrite for FailingWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _: &mut Context<'_>,
        _: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Poll::Ready(Err(std::io::Error::other("index storage unavailable")))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
