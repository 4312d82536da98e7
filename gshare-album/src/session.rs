//! Share session
//!
//! Public entry point. A session owns its configuration, the registered
//! listener and a handle to the host platform. Each `transfer` call builds
//! its own request from a snapshot of the configuration and runs on its
//! own task:
//!
//! ```text
//! transfer(path) -> PermissionGate --denied--> on_denied
//!                        |
//!                     granted -> on_start -> TransferWorker -> on_end | on_skipped
//! ```

use crate::error::TransferError;
use crate::listener::{deliver_terminal, guarded, NoopListener, ShareListener};
use crate::models::{ContextLifetime, MimePolicy, SessionConfig, TransferRequest, TransferResult};
use crate::platform::Platform;
use crate::services::{PermissionGate, TransferWorker};
use gshare_common::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

/// How the session reaches the host platform
enum HostContext {
    Bound(Weak<Platform>),
    Application(Arc<Platform>),
}

impl HostContext {
    fn new(platform: &Arc<Platform>, lifetime: ContextLifetime) -> Self {
        match lifetime {
            ContextLifetime::BoundToCaller => HostContext::Bound(Arc::downgrade(platform)),
            ContextLifetime::ApplicationWide => HostContext::Application(Arc::clone(platform)),
        }
    }

    fn platform(&self) -> Option<Arc<Platform>> {
        match self {
            HostContext::Bound(weak) => weak.upgrade(),
            HostContext::Application(platform) => Some(Arc::clone(platform)),
        }
    }
}

/// Handles dropped by `release`
struct SessionBindings {
    host: HostContext,
    gate: PermissionGate,
}

pub struct ShareSession {
    config: SessionConfig,
    listener: Arc<dyn ShareListener>,
    bindings: Option<SessionBindings>,
}

impl ShareSession {
    /// Session with default configuration, bound to the caller's platform
    pub fn new(platform: &Arc<Platform>) -> Self {
        Self::with_config(platform, SessionConfig::default())
    }

    pub fn with_prefix(platform: &Arc<Platform>, prefix: impl Into<String>) -> Self {
        Self::with_config(
            platform,
            SessionConfig {
                name_prefix: prefix.into(),
                ..SessionConfig::default()
            },
        )
    }

    pub fn with_config(platform: &Arc<Platform>, config: SessionConfig) -> Self {
        let bindings = SessionBindings {
            host: HostContext::new(platform, config.context_lifetime),
            gate: PermissionGate::new(platform.permissions(), platform.api_level()),
        };
        Self {
            config,
            listener: Arc::new(NoopListener),
            bindings: Some(bindings),
        }
    }

    /// Keep the host platform alive for as long as the session holds it
    ///
    /// Fails with `InvalidState` if the session was released or the host is
    /// already gone.
    pub fn enable_application_context(&mut self) -> Result<()> {
        let bindings = self.bindings.as_mut().ok_or_else(released)?;
        let platform = bindings.host.platform().ok_or_else(host_dropped)?;

        bindings.host = HostContext::Application(platform);
        self.config.context_lifetime = ContextLifetime::ApplicationWide;
        Ok(())
    }

    /// Skip transfers whose display name is already indexed
    pub fn enable_duplicate_suppression(&mut self) {
        self.config.suppress_duplicates = true;
    }

    pub fn set_mime_policy(&mut self, policy: MimePolicy) {
        self.config.mime_policy = policy;
    }

    /// Replace the listener; transfers already started keep the old one
    pub fn set_listener(&mut self, listener: Arc<dyn ShareListener>) {
        self.listener = listener;
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Drop the host handle and the permission gate
    ///
    /// In-flight transfers run to completion; later `transfer` calls fail
    /// with `InvalidState`.
    pub fn release(&mut self) {
        if self.bindings.take().is_some() {
            debug!("Share session released");
        }
    }

    pub fn is_released(&self) -> bool {
        self.bindings.is_none()
    }

    /// Start a transfer of `path` and return immediately
    ///
    /// Must be called from within a tokio runtime. Errors are reported only
    /// for a session that cannot start anything; every transfer outcome is
    /// delivered through the listener and the returned handle.
    pub fn transfer(&self, path: impl AsRef<Path>) -> Result<TransferHandle> {
        let bindings = self.bindings.as_ref().ok_or_else(released)?;
        let platform = bindings.host.platform().ok_or_else(host_dropped)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| Error::InvalidState("no async runtime available".to_string()))?;

        let request = TransferRequest::new(path.as_ref(), &self.config);
        let id = request.id;
        let source_path = request.source_path.clone();
        info!(
            transfer_id = %id,
            source = %source_path.display(),
            api_level = platform.api_level(),
            "Transfer requested"
        );

        let join = runtime.spawn(dispatch(
            request,
            bindings.gate.clone(),
            platform,
            Arc::clone(&self.listener),
        ));

        Ok(TransferHandle {
            id,
            source_path,
            join,
        })
    }
}

fn released() -> Error {
    Error::InvalidState("share session released".to_string())
}

fn host_dropped() -> Error {
    Error::InvalidState("host platform dropped".to_string())
}

fn join_failure(path: PathBuf, e: tokio::task::JoinError) -> TransferResult {
    TransferResult::Failed(
        path,
        TransferError::stream("transfer task", std::io::Error::other(e.to_string())),
    )
}

/// Permission continuation; exactly one terminal callback per request
async fn dispatch(
    request: TransferRequest,
    gate: PermissionGate,
    platform: Arc<Platform>,
    listener: Arc<dyn ShareListener>,
) -> TransferResult {
    let id = request.id;
    let path = request.source_path.clone();

    let result = if gate.request().await {
        guarded("on_start", || listener.on_start(&path));

        let worker = TransferWorker::new(platform);
        match tokio::spawn(async move { worker.execute(&request).await }).await {
            Ok(result) => result,
            Err(e) => {
                error!(transfer_id = %id, error = %e, "Transfer worker aborted");
                join_failure(path, e)
            }
        }
    } else {
        info!(transfer_id = %id, source = %path.display(), "Permission denied");
        TransferResult::Denied(path)
    };

    deliver_terminal(listener.as_ref(), &result);
    debug!(transfer_id = %id, outcome = result.label(), "Transfer finished");
    result
}

/// Awaitable handle of a started transfer
#[derive(Debug)]
pub struct TransferHandle {
    id: Uuid,
    source_path: PathBuf,
    join: JoinHandle<TransferResult>,
}

impl TransferHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the terminal result
    pub async fn wait(self) -> TransferResult {
        match self.join.await {
            Ok(result) => result,
            Err(e) => {
                error!(transfer_id = %self.id, error = %e, "Transfer task aborted");
                join_failure(self.source_path, e)
            }
        }
    }
}
