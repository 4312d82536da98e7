//! Terminal outcome of a transfer

use crate::error::{TransferError, TransferErrorKind};
use std::path::{Path, PathBuf};

/// Exactly one per transfer request, delivered once
#[derive(Debug)]
pub enum TransferResult {
    /// Bytes stored and scan notification emitted
    Success(PathBuf),
    /// Permission denied; nothing was attempted
    Denied(PathBuf),
    /// Display name already indexed; nothing was written
    Skipped(PathBuf),
    /// Transfer aborted
    Failed(PathBuf, TransferError),
}

impl TransferResult {
    /// Source path of the request
    pub fn path(&self) -> &Path {
        match self {
            TransferResult::Success(path)
            | TransferResult::Denied(path)
            | TransferResult::Skipped(path)
            | TransferResult::Failed(path, _) => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TransferResult::Success(_))
    }

    pub fn error(&self) -> Option<&TransferError> {
        match self {
            TransferResult::Failed(_, error) => Some(error),
            _ => None,
        }
    }

    /// Failure classification; denial counts as `PermissionDenied`
    pub fn error_kind(&self) -> Option<TransferErrorKind> {
        match self {
            TransferResult::Denied(_) => Some(TransferErrorKind::PermissionDenied),
            TransferResult::Failed(_, error) => Some(error.kind()),
            _ => None,
        }
    }

    /// Short outcome label for logs and CLI output
    pub fn label(&self) -> &'static str {
        match self {
            TransferResult::Success(_) => "success",
            TransferResult::Denied(_) => "denied",
            TransferResult::Skipped(_) => "skipped",
            TransferResult::Failed(_, _) => "failed",
        }
    }

    /// `Ok` for success and skip, `Err` for denial and failure
    pub fn into_result(self) -> Result<PathBuf, TransferError> {
        match self {
            TransferResult::Success(path) | TransferResult::Skipped(path) => Ok(path),
            TransferResult::Denied(path) => Err(TransferError::PermissionDenied(path)),
            TransferResult::Failed(_, error) => Err(error),
        }
    }
}
