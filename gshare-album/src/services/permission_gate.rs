//! Permission gate
//!
//! Every transfer requests the capability required on the current platform
//! before anything is read or written. The request is asked every time;
//! grants are not cached across transfers.

use crate::platform::{Capability, PermissionProvider};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct PermissionGate {
    provider: Arc<dyn PermissionProvider>,
    api_level: u32,
}

impl PermissionGate {
    pub fn new(provider: Arc<dyn PermissionProvider>, api_level: u32) -> Self {
        Self {
            provider,
            api_level,
        }
    }

    /// Capability the current platform requires
    pub fn capability(&self) -> Capability {
        Capability::for_api_level(self.api_level)
    }

    /// Request the required capability; resolves once with the decision
    pub async fn request(&self) -> bool {
        let capability = self.capability();
        debug!(capability = %capability, api_level = self.api_level, "Requesting permission");

        let granted = self.provider.request_permission(capability).await;
        info!(capability = %capability, granted, "Permission resolved");
        granted
    }
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate")
            .field("api_level", &self.api_level)
            .finish_non_exhaustive()
    }
}
