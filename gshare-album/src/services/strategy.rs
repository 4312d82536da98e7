//! Storage strategy selection and shared copy loop
//!
//! Exactly one of two strategies stores a transfer, picked once per
//! transfer from the platform API level:
//! - below API 29 bytes are copied straight into shared storage
//! - from API 29 the entry is inserted into the media index first and the
//!   bytes are streamed through the returned handle

use super::path_validator::ValidatedSource;
use crate::error::TransferError;
use crate::models::TransferTarget;
use crate::platform::{MediaHandle, API_LEVEL_Q};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Bytes moved per read/write cycle
pub const COPY_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    LegacyDirectCopy,
    IndexedInsert,
}

impl StrategyKind {
    /// Pure capability predicate
    pub fn select(api_level: u32) -> Self {
        if api_level < API_LEVEL_Q {
            StrategyKind::LegacyDirectCopy
        } else {
            StrategyKind::IndexedInsert
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::LegacyDirectCopy => "legacy-direct-copy",
            StrategyKind::IndexedInsert => "indexed-insert",
        }
    }
}

/// Where a stored transfer ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredMedia {
    File(PathBuf),
    Indexed(MediaHandle),
}

#[async_trait]
pub trait StorageStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Store the source under the target name and emit a scan notification
    async fn store(
        &self,
        source: &ValidatedSource,
        target: &TransferTarget,
    ) -> Result<StoredMedia, TransferError>;
}

/// Copy all bytes in [`COPY_BUFFER_SIZE`] chunks, returning the byte count
///
/// Does not flush or close the writer.
pub async fn copy_stream<R, W>(reader: &mut R, writer: &mut W) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buffer = [0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let len = reader
            .read(&mut buffer)
            .await
            .map_err(|e| TransferError::stream("read source", e))?;
        if len == 0 {
            break;
        }

        writer
            .write_all(&buffer[..len])
            .await
            .map_err(|e| TransferError::stream("write target", e))?;
        total += len as u64;
    }

    Ok(total)
}
