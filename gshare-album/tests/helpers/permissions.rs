//! Scripted permission subsystems

use async_trait::async_trait;
use gshare_album::{Capability, PermissionProvider};
use std::sync::Mutex;
use tokio::sync::oneshot;

/// Answers every request with a fixed decision and records what was asked
pub struct ScriptedPermissions {
    grant: bool,
    requested: Mutex<Vec<Capability>>,
}

impl ScriptedPermissions {
    pub fn granting() -> Self {
        Self {
            grant: true,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn denying() -> Self {
        Self {
            grant: false,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<Capability> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PermissionProvider for ScriptedPermissions {
    async fn request_permission(&self, capability: Capability) -> bool {
        self.requested.lock().unwrap().push(capability);
        self.grant
    }
}

/// Holds the first request open until the test resolves it
pub struct DeferredPermissions {
    decision: Mutex<Option<oneshot::Receiver<bool>>>,
}

impl DeferredPermissions {
    pub fn new() -> (Self, oneshot::Sender<bool>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                decision: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

#[async_trait]
impl PermissionProvider for DeferredPermissions {
    async fn request_permission(&self, _capability: Capability) -> bool {
        let rx = self.decision.lock().unwrap().take();
        match rx {
            Some(rx) => rx.await.unwrap_or(false),
            None => false,
        }
    }
}
