//! Source path validation

use crate::error::TransferError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Source file that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSource {
    /// Path as given by the caller
    pub path: PathBuf,
    pub absolute_path: PathBuf,
    pub file_name: String,
    /// Byte size at validation time
    pub size: u64,
}

/// Verifies the source exists before any other step runs
#[derive(Debug, Clone, Copy, Default)]
pub struct PathValidator;

impl PathValidator {
    pub async fn validate(&self, path: &Path) -> Result<ValidatedSource, TransferError> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TransferError::SourceMissing(path.to_path_buf()));
            }
            Err(e) => return Err(TransferError::stream("stat source", e)),
        };

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| TransferError::SourceMissing(path.to_path_buf()))?;

        let absolute_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| TransferError::stream("resolve working directory", e))?
                .join(path)
        };

        Ok(ValidatedSource {
            path: path.to_path_buf(),
            absolute_path,
            file_name,
            size: metadata.len(),
        })
    }
}
