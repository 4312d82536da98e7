//! SQLite-backed media index
//!
//! Metadata lives in the `media_entries` table; entry content is stored as
//! one file per entry under a blob directory, named by the entry id. Scan
//! notifications are logged to `scan_requests` and processed by a spawned
//! task, so `notify_scanned` returns immediately. Processed scans are
//! broadcast as [`ScanCompleted`].

use super::record_for_scanned_file;
use crate::platform::{
    MediaColumn, MediaHandle, MediaIndex, MediaRecord, MediaWriter, ScanTarget,
};
use async_trait::async_trait;
use gshare_common::{Error, Result};
use serde::Serialize;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Scan completion notices buffered per slow subscriber
const SCAN_CHANNEL_CAPACITY: usize = 64;

/// Outcome of one processed scan notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanCompleted {
    /// `file://` path or handle URI that was scanned
    pub target: String,
    /// Entry the scan resolved to, if any
    pub handle: Option<MediaHandle>,
}

/// One row of the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    pub handle: MediaHandle,
    #[serde(flatten)]
    pub record: MediaRecord,
}

pub struct SqliteMediaIndex {
    pool: SqlitePool,
    blob_dir: PathBuf,
    scans: broadcast::Sender<ScanCompleted>,
}

impl SqliteMediaIndex {
    /// Open (creating if needed) the catalog at `db_path`
    pub async fn open(db_path: &Path, blob_dir: impl Into<PathBuf>) -> Result<Self> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        if newly_created {
            info!("Initialized new media index: {}", db_path.display());
        } else {
            info!("Opened existing media index: {}", db_path.display());
        }

        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA busy_timeout = 5000")
            .execute(&pool)
            .await?;

        Self::from_pool(pool, blob_dir).await
    }

    /// Use an existing pool; tables are created if missing
    pub async fn from_pool(pool: SqlitePool, blob_dir: impl Into<PathBuf>) -> Result<Self> {
        let blob_dir = blob_dir.into();
        tokio::fs::create_dir_all(&blob_dir).await?;
        init_tables(&pool).await?;

        let (scans, _) = broadcast::channel(SCAN_CHANNEL_CAPACITY);
        Ok(Self {
            pool,
            blob_dir,
            scans,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Receive every scan processed after this call
    pub fn subscribe_scans(&self) -> broadcast::Receiver<ScanCompleted> {
        self.scans.subscribe()
    }

    /// All entries, oldest first
    pub async fn list(&self) -> Result<Vec<IndexEntry>> {
        let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_ENTRIES))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(entry_from_row).collect()
    }

    /// Location of an entry's bytes
    ///
    /// Entries created through the index keep their content in the blob
    /// directory; entries created by a file scan point at the scanned file.
    pub async fn content_path(&self, handle: &MediaHandle) -> Result<PathBuf> {
        let id = entry_id(handle)?;
        let blob = self.blob_dir.join(id.to_string());
        if tokio::fs::try_exists(&blob).await? {
            return Ok(blob);
        }

        let data_path: Option<String> =
            sqlx::query_scalar("SELECT data_path FROM media_entries WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        data_path
            .map(PathBuf::from)
            .ok_or_else(|| Error::NotFound(handle.to_string()))
    }

    async fn entry_exists(&self, id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media_entries WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}

const SELECT_ENTRIES: &str = "SELECT id, title, display_name, mime_type, date_taken, \
     date_modified, date_added, orientation, data_path, size FROM media_entries";

async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            display_name TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            date_taken INTEGER NOT NULL,
            date_modified INTEGER NOT NULL,
            date_added INTEGER NOT NULL,
            orientation INTEGER NOT NULL DEFAULT 0,
            data_path TEXT NOT NULL,
            size INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_media_entries_display_name ON media_entries(display_name)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scan_requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            target TEXT NOT NULL,
            requested_at TEXT NOT NULL,
            completed_at TEXT,
            media_id INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn entry_id(handle: &MediaHandle) -> Result<i64> {
    handle
        .media_id()
        .ok_or_else(|| Error::NotFound(handle.to_string()))
}

fn entry_from_row(row: &SqliteRow) -> Result<IndexEntry> {
    let id: i64 = row.try_get("id")?;
    let data_path: String = row.try_get("data_path")?;
    let size: i64 = row.try_get("size")?;

    Ok(IndexEntry {
        handle: MediaHandle::for_id(id),
        record: MediaRecord {
            title: row.try_get("title")?,
            display_name: row.try_get("display_name")?,
            mime_type: row.try_get("mime_type")?,
            date_taken: row.try_get("date_taken")?,
            date_modified: row.try_get("date_modified")?,
            date_added: row.try_get("date_added")?,
            orientation: row.try_get("orientation")?,
            data_path: PathBuf::from(data_path),
            size: size.max(0) as u64,
        },
    })
}

async fn insert_record(pool: &SqlitePool, record: &MediaRecord) -> Result<MediaHandle> {
    let result = sqlx::query(
        r#"
        INSERT INTO media_entries (
            title, display_name, mime_type, date_taken, date_modified,
            date_added, orientation, data_path, size
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.title)
    .bind(&record.display_name)
    .bind(&record.mime_type)
    .bind(record.date_taken)
    .bind(record.date_modified)
    .bind(record.date_added)
    .bind(record.orientation)
    .bind(record.data_path.to_string_lossy().into_owned())
    .bind(record.size as i64)
    .execute(pool)
    .await?;

    Ok(MediaHandle::for_id(result.last_insert_rowid()))
}

/// Log, resolve and complete one scan notification
async fn process_scan(pool: &SqlitePool, target: &ScanTarget) -> Result<Option<MediaHandle>> {
    let scan_id = sqlx::query("INSERT INTO scan_requests (target, requested_at) VALUES (?, ?)")
        .bind(target.to_string())
        .bind(gshare_common::time::now().to_rfc3339())
        .execute(pool)
        .await?
        .last_insert_rowid();

    let handle = match target {
        ScanTarget::Handle(handle) => {
            let id = entry_id(handle)?;
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media_entries WHERE id = ?")
                .bind(id)
                .fetch_one(pool)
                .await?;
            (count > 0).then(|| handle.clone())
        }
        ScanTarget::File(path) => {
            let existing: Option<i64> =
                sqlx::query_scalar("SELECT id FROM media_entries WHERE data_path = ? LIMIT 1")
                    .bind(path.to_string_lossy().into_owned())
                    .fetch_optional(pool)
                    .await?;

            match existing {
                Some(id) => Some(MediaHandle::for_id(id)),
                None => {
                    let scan_path = path.clone();
                    let record =
                        tokio::task::spawn_blocking(move || record_for_scanned_file(&scan_path))
                            .await
                            .map_err(|e| Error::Internal(format!("scan task failed: {}", e)))?;
                    match record {
                        Ok(record) => Some(insert_record(pool, &record).await?),
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "Scan found nothing to index");
                            None
                        }
                    }
                }
            }
        }
    };

    sqlx::query("UPDATE scan_requests SET completed_at = ?, media_id = ? WHERE id = ?")
        .bind(gshare_common::time::now().to_rfc3339())
        .bind(handle.as_ref().and_then(MediaHandle::media_id))
        .bind(scan_id)
        .execute(pool)
        .await?;

    Ok(handle)
}

#[async_trait]
impl MediaIndex for SqliteMediaIndex {
    async fn insert(&self, record: &MediaRecord) -> Result<MediaHandle> {
        let handle = insert_record(&self.pool, record).await?;
        debug!(handle = %handle, display_name = %record.display_name, "Indexed entry");
        Ok(handle)
    }

    async fn open_write(&self, handle: &MediaHandle) -> Result<MediaWriter> {
        let id = entry_id(handle)?;
        if !self.entry_exists(id).await? {
            return Err(Error::NotFound(handle.to_string()));
        }

        let file = tokio::fs::File::create(self.blob_dir.join(id.to_string())).await?;
        Ok(Box::new(file))
    }

    async fn query(&self, column: MediaColumn, value: &str) -> Result<Vec<MediaHandle>> {
        let sql = format!(
            "SELECT id FROM media_entries WHERE {} = ? ORDER BY id",
            column.column_name()
        );
        let ids: Vec<i64> = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids.into_iter().map(MediaHandle::for_id).collect())
    }

    async fn delete(&self, handle: &MediaHandle) -> Result<()> {
        let id = entry_id(handle)?;
        let result = sqlx::query("DELETE FROM media_entries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(handle.to_string()));
        }

        match tokio::fs::remove_file(self.blob_dir.join(id.to_string())).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn notify_scanned(&self, target: ScanTarget) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!(scan = %target, "No runtime to process scan notification, dropping it");
                return;
            }
        };

        let pool = self.pool.clone();
        let scans = self.scans.clone();
        runtime.spawn(async move {
            match process_scan(&pool, &target).await {
                Ok(handle) => {
                    debug!(scan = %target, handle = ?handle, "Scan processed");
                    let _ = scans.send(ScanCompleted {
                        target: target.to_string(),
                        handle,
                    });
                }
                Err(e) => warn!(scan = %target, error = %e, "Scan processing failed"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;

    fn record(display_name: &str) -> MediaRecord {
        MediaRecord {
            title: "photo.jpg".to_string(),
            display_name: display_name.to_string(),
            mime_type: "image/jpeg".to_string(),
            date_taken: 1_700_000_000_000,
            date_modified: 1_700_000_000_000,
            date_added: 1_700_000_000_000,
            orientation: 0,
            data_path: PathBuf::from("/tmp/photo.jpg"),
            size: 5,
        }
    }

    #[tokio::test]
    async fn test_insert_write_list() {
        let dir = TempDir::new().unwrap();
        let index = SqliteMediaIndex::open(&dir.path().join("gshare.db"), dir.path().join("blobs"))
            .await
            .unwrap();

        let handle = index.insert(&record("album_photo.jpg")).await.unwrap();
        let mut writer = index.open_write(&handle).await.unwrap();
        writer.write_all(b"hello").await.unwrap();
        writer.shutdown().await.unwrap();

        let content = std::fs::read(index.content_path(&handle).await.unwrap()).unwrap();
        assert_eq!(content, b"hello");

        let entries = index.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].handle, handle);
        assert_eq!(entries[0].record, record("album_photo.jpg"));
    }

    #[tokio::test]
    async fn test_open_write_unknown_handle() {
        let dir = TempDir::new().unwrap();
        let index = SqliteMediaIndex::open(&dir.path().join("gshare.db"), dir.path().join("blobs"))
            .await
            .unwrap();

        let result = index.open_write(&MediaHandle::for_id(99)).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
