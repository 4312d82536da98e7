//! Platform collaborators
//!
//! The transfer core never talks to an operating system directly. It sees a
//! [`Platform`]: an API level, a shared-storage root, a permission
//! subsystem and a media index.

pub mod capability;
pub mod media_index;
pub mod permissions;

pub use capability::{Capability, API_LEVEL_Q, API_LEVEL_TIRAMISU};
pub use media_index::{
    MediaColumn, MediaHandle, MediaIndex, MediaRecord, MediaWriter, ScanTarget, MEDIA_URI_BASE,
};
pub use permissions::{ConfiguredPermissions, PermissionProvider};

use std::path::PathBuf;
use std::sync::Arc;

/// Shared-storage subdirectory used by direct copies
pub const CAMERA_DIR: [&str; 2] = ["DCIM", "Camera"];

/// Host platform handle
///
/// Owned by the embedding application; share sessions hold either a weak
/// or a strong reference to it depending on their context lifetime.
pub struct Platform {
    api_level: u32,
    shared_storage_root: PathBuf,
    permissions: Arc<dyn PermissionProvider>,
    media_index: Arc<dyn MediaIndex>,
}

impl Platform {
    pub fn new(
        api_level: u32,
        shared_storage_root: impl Into<PathBuf>,
        permissions: Arc<dyn PermissionProvider>,
        media_index: Arc<dyn MediaIndex>,
    ) -> Arc<Self> {
        Arc::new(Self {
            api_level,
            shared_storage_root: shared_storage_root.into(),
            permissions,
            media_index,
        })
    }

    pub fn api_level(&self) -> u32 {
        self.api_level
    }

    pub fn shared_storage_root(&self) -> &PathBuf {
        &self.shared_storage_root
    }

    /// `<shared storage root>/DCIM/Camera`
    pub fn camera_dir(&self) -> PathBuf {
        CAMERA_DIR
            .iter()
            .fold(self.shared_storage_root.clone(), |dir, part| dir.join(part))
    }

    pub fn permissions(&self) -> Arc<dyn PermissionProvider> {
        Arc::clone(&self.permissions)
    }

    pub fn media_index(&self) -> Arc<dyn MediaIndex> {
        Arc::clone(&self.media_index)
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("api_level", &self.api_level)
            .field("shared_storage_root", &self.shared_storage_root)
            .finish_non_exhaustive()
    }
}
