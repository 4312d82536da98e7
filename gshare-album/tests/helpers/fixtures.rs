//! Temporary platform environments

use gshare_album::index::InMemoryMediaIndex;
use gshare_album::{PermissionProvider, Platform};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Deterministic, non-repeating-per-KiB byte pattern
pub fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + i / 256) % 256) as u8).collect()
}

/// Temp directory holding sources and shared storage, plus an in-memory index
pub struct TestEnv {
    pub dir: TempDir,
    pub index: Arc<InMemoryMediaIndex>,
    pub platform: Arc<Platform>,
}

impl TestEnv {
    pub fn new(api_level: u32, permissions: Arc<dyn PermissionProvider>) -> Self {
        let dir = TempDir::new().unwrap();
        let index = Arc::new(InMemoryMediaIndex::new());
        let platform = Platform::new(
            api_level,
            dir.path().join("shared"),
            permissions,
            index.clone(),
        );
        Self {
            dir,
            index,
            platform,
        }
    }

    /// Environment whose permission subsystem grants everything
    pub fn granted(api_level: u32) -> Self {
        Self::new(
            api_level,
            Arc::new(gshare_album::platform::ConfiguredPermissions::grant_all()),
        )
    }

    pub fn shared_root(&self) -> PathBuf {
        self.dir.path().join("shared")
    }

    pub fn camera_dir(&self) -> PathBuf {
        self.shared_root().join("DCIM").join("Camera")
    }

    /// Write a source file under `<tmp>/<subdir>/<name>`
    pub fn write_source_in(&self, subdir: &str, name: &str, bytes: &[u8]) -> PathBuf {
        let dir = self.dir.path().join(subdir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    pub fn write_source(&self, name: &str, bytes: &[u8]) -> PathBuf {
        self.write_source_in("source", name, bytes)
    }
}
