//! Permission subsystem seam

use super::Capability;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::warn;

/// Asynchronous permission subsystem
///
/// The returned future resolves exactly once with the grant decision. It
/// may wait on user interaction for as long as it needs.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn request_permission(&self, capability: Capability) -> bool;
}

/// Grants a fixed set of capabilities
#[derive(Debug, Clone, Default)]
pub struct ConfiguredPermissions {
    granted: HashSet<Capability>,
}

impl ConfiguredPermissions {
    pub fn new(granted: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            granted: granted.into_iter().collect(),
        }
    }

    pub fn grant_all() -> Self {
        Self::new([Capability::WriteExternalStorage, Capability::ReadMediaImages])
    }

    pub fn deny_all() -> Self {
        Self::default()
    }

    /// Build from capability identifiers; unknown ids are ignored
    pub fn from_ids<S: AsRef<str>>(ids: &[S]) -> Self {
        let granted = ids
            .iter()
            .filter_map(|id| {
                let id = id.as_ref();
                let cap = Capability::from_id(id);
                if cap.is_none() {
                    warn!(capability = id, "Ignoring unknown capability identifier");
                }
                cap
            })
            .collect();
        Self { granted }
    }

    pub fn is_granted(&self, capability: Capability) -> bool {
        self.granted.contains(&capability)
    }
}

#[async_trait]
impl PermissionProvider for ConfiguredPermissions {
    async fn request_permission(&self, capability: Capability) -> bool {
        self.is_granted(capability)
    }
}
