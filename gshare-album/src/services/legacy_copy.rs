//! Direct copy into shared storage (platforms below API 29)
//!
//! Bytes go to `<shared storage>/DCIM/Camera/<prefix><file name>`. The file
//! is not known to the index until the scan notification is processed,
//! and the strategy does not wait for that.
//!
//! Bytes are staged in a hidden sibling file and renamed onto the target
//! after they are synced. A failed copy never touches an existing target,
//! and a source that already sits at the target path is not truncated.

use super::path_validator::ValidatedSource;
use super::strategy::{copy_stream, StorageStrategy, StoredMedia, StrategyKind};
use crate::error::TransferError;
use crate::models::TransferTarget;
use crate::platform::{MediaIndex, ScanTarget};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct LegacyDirectCopyStrategy {
    target_dir: PathBuf,
    media_index: Arc<dyn MediaIndex>,
}

impl LegacyDirectCopyStrategy {
    pub fn new(target_dir: impl Into<PathBuf>, media_index: Arc<dyn MediaIndex>) -> Self {
        Self {
            target_dir: target_dir.into(),
            media_index,
        }
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Hidden sibling of the target that receives the bytes first
    fn staging_path(&self, display_name: &str) -> PathBuf {
        self.target_dir
            .join(format!(".{}.{}.part", display_name, Uuid::new_v4().simple()))
    }

    /// Create the target directory; only an error if it still is missing
    async fn ensure_target_dir(&self) -> Result<(), TransferError> {
        if let Err(source) = tokio::fs::create_dir_all(&self.target_dir).await {
            let is_dir = tokio::fs::metadata(&self.target_dir)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            if !is_dir {
                return Err(TransferError::DirectoryCreateFailed {
                    dir: self.target_dir.clone(),
                    source,
                });
            }
            debug!(dir = %self.target_dir.display(), error = %source, "Directory appeared concurrently");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageStrategy for LegacyDirectCopyStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LegacyDirectCopy
    }

    async fn store(
        &self,
        source: &ValidatedSource,
        target: &TransferTarget,
    ) -> Result<StoredMedia, TransferError> {
        self.ensure_target_dir().await?;

        let target_path = self.target_dir.join(&target.display_name);
        let staging_path = self.staging_path(&target.display_name);

        let mut input = File::open(&source.path)
            .await
            .map_err(|e| TransferError::stream("open source", e))?;

        // The target is only replaced once the staged copy is complete
        let guard = PartialFileGuard::new(staging_path.clone());
        let bytes = copy_into_new_file(&mut input, &staging_path).await?;
        drop(input);
        tokio::fs::rename(&staging_path, &target_path)
            .await
            .map_err(|e| TransferError::stream("move staged target", e))?;
        guard.disarm();

        info!(
            path = %target_path.display(),
            bytes,
            "Copied into shared storage"
        );

        self.media_index
            .notify_scanned(ScanTarget::File(target_path.clone()));

        Ok(StoredMedia::File(target_path))
    }
}

/// Create `target_path` and fill it; the output is closed on every path
async fn copy_into_new_file(input: &mut File, target_path: &Path) -> Result<u64, TransferError> {
    let mut output = File::create(target_path)
        .await
        .map_err(|e| TransferError::stream("create target", e))?;

    let bytes = copy_stream(input, &mut output).await?;
    output
        .flush()
        .await
        .map_err(|e| TransferError::stream("flush target", e))?;
    output
        .sync_all()
        .await
        .map_err(|e| TransferError::stream("sync target", e))?;

    Ok(bytes)
}

/// Removes a partially written staging file unless disarmed
struct PartialFileGuard {
    path: PathBuf,
    armed: bool,
}

impl PartialFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if self.armed {
            match std::fs::remove_file(&self.path) {
                Ok(()) => debug!(path = %self.path.display(), "Removed partial target"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Failed to remove partial target")
                }
            }
        }
    }
}
