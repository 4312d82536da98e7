//! Media index implementations
//!
//! - [`SqliteMediaIndex`]: persistent catalog backed by SQLite plus a blob
//!   directory for entry content, used by the CLI
//! - [`InMemoryMediaIndex`]: process-local catalog with failure injection,
//!   used by tests and embedders that do not need persistence
//!
//! Both index a scanned file that they do not know yet, so a file copied
//! directly into shared storage becomes visible to duplicate checks once
//! its scan notification is processed.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryMediaIndex;
pub use sqlite::{IndexEntry, ScanCompleted, SqliteMediaIndex};

use crate::models::FALLBACK_MIME_TYPE;
use crate::platform::MediaRecord;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Metadata record for a file found by a scan
pub(crate) fn record_for_scanned_file(path: &Path) -> std::io::Result<MediaRecord> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("not a regular file: {}", path.display()),
        ));
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mime_type = infer::get_from_path(path)?
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string());

    let now = gshare_common::time::now_millis();
    let modified = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(now);

    Ok(MediaRecord {
        title: file_name.clone(),
        display_name: file_name,
        mime_type,
        date_taken: modified,
        date_modified: modified,
        date_added: now,
        orientation: 0,
        data_path: path.to_path_buf(),
        size: metadata.len(),
    })
}
