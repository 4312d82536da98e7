//! Platform media index seam
//!
//! The index is an external catalog of shared media. Inserting a record
//! yields an opaque handle; bytes are then written through that handle.
//! Scan notifications ask the index to refresh a location and are
//! fire-and-forget.

use async_trait::async_trait;
use gshare_common::Result;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tokio::io::AsyncWrite;

/// Handle URI prefix for indexed images
pub const MEDIA_URI_BASE: &str = "content://media/external/images/media";

/// Opaque handle to an indexed media entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MediaHandle(String);

impl MediaHandle {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Handle for a numeric row id under [`MEDIA_URI_BASE`]
    pub fn for_id(id: i64) -> Self {
        Self(format!("{}/{}", MEDIA_URI_BASE, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric id of a handle minted by [`MediaHandle::for_id`]
    pub fn media_id(&self) -> Option<i64> {
        self.0
            .strip_prefix(MEDIA_URI_BASE)?
            .strip_prefix('/')?
            .parse()
            .ok()
    }
}

impl fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata record inserted before any bytes are written
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaRecord {
    pub title: String,
    pub display_name: String,
    pub mime_type: String,
    /// Milliseconds since the Unix epoch
    pub date_taken: i64,
    pub date_modified: i64,
    pub date_added: i64,
    pub orientation: i32,
    /// Absolute path of the file the entry was created from
    pub data_path: PathBuf,
    pub size: u64,
}

/// Queryable index columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaColumn {
    DisplayName,
    Title,
    MimeType,
    DataPath,
}

impl MediaColumn {
    pub fn column_name(&self) -> &'static str {
        match self {
            MediaColumn::DisplayName => "display_name",
            MediaColumn::Title => "title",
            MediaColumn::MimeType => "mime_type",
            MediaColumn::DataPath => "data_path",
        }
    }

    /// Field value of a record for this column
    pub fn value_of<'a>(&self, record: &'a MediaRecord) -> std::borrow::Cow<'a, str> {
        match self {
            MediaColumn::DisplayName => record.display_name.as_str().into(),
            MediaColumn::Title => record.title.as_str().into(),
            MediaColumn::MimeType => record.mime_type.as_str().into(),
            MediaColumn::DataPath => record.data_path.to_string_lossy(),
        }
    }
}

/// Location named by a scan notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    /// File written directly into shared storage
    File(PathBuf),
    /// Entry created through the index
    Handle(MediaHandle),
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanTarget::File(path) => write!(f, "file://{}", path.display()),
            ScanTarget::Handle(handle) => write!(f, "{}", handle),
        }
    }
}

/// Writable stream opened against an index handle
pub type MediaWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Platform media index
#[async_trait]
pub trait MediaIndex: Send + Sync {
    /// Insert a metadata record, returning the handle of the new entry
    async fn insert(&self, record: &MediaRecord) -> Result<MediaHandle>;

    /// Open a write stream for the content of an entry
    async fn open_write(&self, handle: &MediaHandle) -> Result<MediaWriter>;

    /// Handles of entries whose column equals `value` exactly
    async fn query(&self, column: MediaColumn, value: &str) -> Result<Vec<MediaHandle>>;

    /// Remove an entry and its content
    async fn delete(&self, handle: &MediaHandle) -> Result<()>;

    /// Ask the index to refresh a location; must not block on the refresh
    fn notify_scanned(&self, target: ScanTarget);
}
