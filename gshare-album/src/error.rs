//! Error types for gshare-album
//!
//! Every failure that can happen after permission is granted is a
//! `TransferError`. They never escape the transfer worker: the worker turns
//! them into `TransferResult::Failed`.

use std::path::PathBuf;
use thiserror::Error;

/// Transfer failure
#[derive(Debug, Error)]
pub enum TransferError {
    /// Source file absent when the worker started
    #[error("Source file not found: {0}")]
    SourceMissing(PathBuf),

    /// Permission request resolved to denied
    #[error("Permission denied for {0}")]
    PermissionDenied(PathBuf),

    /// Shared-storage directory could not be created
    #[error("Failed to create directory {dir}: {source}")]
    DirectoryCreateFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Read, write or open failure while copying bytes
    #[error("Stream I/O error ({context}): {source}")]
    StreamIo {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Media index rejected the metadata record
    #[error("Index insert failed: {0}")]
    IndexInsertFailed(String),
}

impl TransferError {
    /// Wrap an I/O error with the step that produced it
    pub fn stream(context: impl Into<String>, source: std::io::Error) -> Self {
        TransferError::StreamIo {
            context: context.into(),
            source,
        }
    }

    /// Wrap a platform error that surfaced during streaming
    pub fn platform(context: impl Into<String>, error: gshare_common::Error) -> Self {
        let source = match error {
            gshare_common::Error::Io(io) => io,
            other => std::io::Error::other(other.to_string()),
        };
        TransferError::stream(context, source)
    }

    pub fn kind(&self) -> TransferErrorKind {
        match self {
            TransferError::SourceMissing(_) => TransferErrorKind::SourceMissing,
            TransferError::PermissionDenied(_) => TransferErrorKind::PermissionDenied,
            TransferError::DirectoryCreateFailed { .. } => TransferErrorKind::DirectoryCreateFailed,
            TransferError::StreamIo { .. } => TransferErrorKind::StreamIo,
            TransferError::IndexInsertFailed(_) => TransferErrorKind::IndexInsertFailed,
        }
    }
}

/// Payload-free error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferErrorKind {
    SourceMissing,
    PermissionDenied,
    DirectoryCreateFailed,
    StreamIo,
    IndexInsertFailed,
}

impl TransferErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferErrorKind::SourceMissing => "SourceMissing",
            TransferErrorKind::PermissionDenied => "PermissionDenied",
            TransferErrorKind::DirectoryCreateFailed => "DirectoryCreateFailed",
            TransferErrorKind::StreamIo => "StreamIOError",
            TransferErrorKind::IndexInsertFailed => "IndexInsertFailed",
        }
    }
}

impl std::fmt::Display for TransferErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
