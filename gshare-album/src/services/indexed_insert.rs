//! Indexed insert into the media index (platforms at API 29 and above)
//!
//! The metadata record is inserted first; the returned handle is then
//! opened for writing and the bytes are streamed through it. A streaming
//! failure after the insert removes the entry again so the index is not
//! left pointing at empty content.

use super::path_validator::ValidatedSource;
use super::strategy::{copy_stream, StorageStrategy, StoredMedia, StrategyKind};
use crate::error::TransferError;
use crate::models::TransferTarget;
use crate::platform::{MediaHandle, MediaIndex, MediaRecord, ScanTarget};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

pub struct IndexedInsertStrategy {
    media_index: Arc<dyn MediaIndex>,
}

impl IndexedInsertStrategy {
    pub fn new(media_index: Arc<dyn MediaIndex>) -> Self {
        Self { media_index }
    }

    fn record_for(source: &ValidatedSource, target: &TransferTarget) -> MediaRecord {
        MediaRecord {
            title: target.title.clone(),
            display_name: target.display_name.clone(),
            mime_type: target.mime_type.clone(),
            date_taken: target.timestamp_ms,
            date_modified: target.timestamp_ms,
            date_added: target.timestamp_ms,
            orientation: 0,
            data_path: source.absolute_path.clone(),
            size: source.size,
        }
    }

    async fn stream_content(
        &self,
        source: &ValidatedSource,
        handle: &MediaHandle,
    ) -> Result<u64, TransferError> {
        let mut writer = self
            .media_index
            .open_write(handle)
            .await
            .map_err(|e| TransferError::platform("open index handle", e))?;

        let mut input = File::open(&source.path)
            .await
            .map_err(|e| TransferError::stream("open source", e))?;

        let bytes = copy_stream(&mut input, &mut writer).await?;
        writer
            .shutdown()
            .await
            .map_err(|e| TransferError::stream("close index handle", e))?;

        Ok(bytes)
    }
}

#[async_trait]
impl StorageStrategy for IndexedInsertStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::IndexedInsert
    }

    async fn store(
        &self,
        source: &ValidatedSource,
        target: &TransferTarget,
    ) -> Result<StoredMedia, TransferError> {
        let record = Self::record_for(source, target);
        let handle = self
            .media_index
            .insert(&record)
            .await
            .map_err(|e| TransferError::IndexInsertFailed(e.to_string()))?;

        let bytes = match self.stream_content(source, &handle).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if let Err(delete_err) = self.media_index.delete(&handle).await {
                    warn!(
                        handle = %handle,
                        error = %delete_err,
                        "Failed to roll back index entry"
                    );
                }
                return Err(e);
            }
        };

        info!(handle = %handle, bytes, "Streamed into media index");

        self.media_index
            .notify_scanned(ScanTarget::Handle(handle.clone()));

        Ok(StoredMedia::Indexed(handle))
    }
}
