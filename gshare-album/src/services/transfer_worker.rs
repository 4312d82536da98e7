//! Transfer worker
//!
//! Runs the post-permission pipeline for one request:
//!
//! 1. VALIDATE: source must exist
//! 2. DEDUPE: optional display-name lookup in the media index
//! 3. TARGET: display name, mime type and timestamps
//! 4. STORE: legacy direct copy or indexed insert by API level
//!
//! All errors are caught here and reported as `TransferResult::Failed`.

use super::duplicate_checker::DuplicateChecker;
use super::indexed_insert::IndexedInsertStrategy;
use super::legacy_copy::LegacyDirectCopyStrategy;
use super::path_validator::PathValidator;
use super::strategy::{StorageStrategy, StoredMedia, StrategyKind};
use crate::error::TransferError;
use crate::models::{TransferRequest, TransferResult, TransferTarget};
use crate::platform::Platform;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct TransferWorker {
    platform: Arc<Platform>,
}

impl TransferWorker {
    pub fn new(platform: Arc<Platform>) -> Self {
        Self { platform }
    }

    /// Strategy for the platform this worker runs against
    pub fn strategy(&self) -> Box<dyn StorageStrategy> {
        match StrategyKind::select(self.platform.api_level()) {
            StrategyKind::LegacyDirectCopy => Box::new(LegacyDirectCopyStrategy::new(
                self.platform.camera_dir(),
                self.platform.media_index(),
            )),
            StrategyKind::IndexedInsert => {
                Box::new(IndexedInsertStrategy::new(self.platform.media_index()))
            }
        }
    }

    /// Execute one transfer; never returns an error
    pub async fn execute(&self, request: &TransferRequest) -> TransferResult {
        let path = request.source_path.clone();

        match self.run(request).await {
            Ok(Some(stored)) => {
                info!(
                    transfer_id = %request.id,
                    source = %path.display(),
                    stored = ?stored,
                    "Transfer complete"
                );
                TransferResult::Success(path)
            }
            Ok(None) => TransferResult::Skipped(path),
            Err(e) => {
                warn!(
                    transfer_id = %request.id,
                    source = %path.display(),
                    error_kind = %e.kind(),
                    error = %e,
                    "Transfer failed"
                );
                TransferResult::Failed(path, e)
            }
        }
    }

    /// `Ok(None)` when the transfer was suppressed as a duplicate
    async fn run(&self, request: &TransferRequest) -> Result<Option<StoredMedia>, TransferError> {
        let source = PathValidator.validate(&request.source_path).await?;

        if request.suppress_duplicates {
            let checker = DuplicateChecker::new(self.platform.media_index());
            if checker.exists(&request.name_prefix, &source.file_name).await {
                info!(
                    transfer_id = %request.id,
                    display_name = %request.display_name(&source.file_name),
                    "Already indexed, skipping"
                );
                return Ok(None);
            }
        }

        let mime_type = request.mime_policy.resolve(&source.path).await;
        let target = TransferTarget::new(request, &source.file_name, mime_type);

        let strategy = self.strategy();
        debug!(
            transfer_id = %request.id,
            strategy = strategy.kind().name(),
            display_name = %target.display_name,
            mime_type = %target.mime_type,
            bytes = source.size,
            "Storing"
        );

        strategy.store(&source, &target).await.map(Some)
    }
}
