//! Session configuration and per-call transfer request

use gshare_common::config::SessionSettings;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use uuid::Uuid;

/// Prefix used when a session is created without one
pub const DEFAULT_NAME_PREFIX: &str = "album_";

/// Mime type recorded by the fixed policy
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Mime type when sniffing finds nothing recognizable
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Bytes read from the head of the source for mime sniffing
const SNIFF_LEN: usize = 8192;

/// How long a session may keep its host context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextLifetime {
    /// Weak reference; transfers fail once the caller drops the host
    #[default]
    BoundToCaller,
    /// Strong reference held until the session is released
    ApplicationWide,
}

/// Mime type recorded for indexed entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimePolicy {
    Fixed(String),
    /// Sniff magic bytes of the source
    Inferred,
}

impl Default for MimePolicy {
    fn default() -> Self {
        MimePolicy::Fixed(DEFAULT_MIME_TYPE.to_string())
    }
}

impl MimePolicy {
    /// Mime type for a source file under this policy
    ///
    /// Sniffing failures fall back to [`FALLBACK_MIME_TYPE`]; they never
    /// fail the transfer.
    pub async fn resolve(&self, source: &Path) -> String {
        match self {
            MimePolicy::Fixed(mime) => mime.clone(),
            MimePolicy::Inferred => match read_head(source).await {
                Ok(head) => infer::get(&head)
                    .map(|kind| kind.mime_type().to_string())
                    .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string()),
                Err(e) => {
                    tracing::debug!(path = %source.display(), error = %e, "Mime sniffing failed");
                    FALLBACK_MIME_TYPE.to_string()
                }
            },
        }
    }
}

async fn read_head(source: &Path) -> std::io::Result<Vec<u8>> {
    let file = tokio::fs::File::open(source).await?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut head).await?;
    Ok(head)
}

/// Session configuration
///
/// Changed only through `&mut` access on the session; each transfer takes
/// its own snapshot, so changes never reach a running transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub name_prefix: String,
    pub suppress_duplicates: bool,
    pub context_lifetime: ContextLifetime,
    pub mime_policy: MimePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            suppress_duplicates: false,
            context_lifetime: ContextLifetime::BoundToCaller,
            mime_policy: MimePolicy::default(),
        }
    }
}

impl From<&SessionSettings> for SessionConfig {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            name_prefix: settings.name_prefix.clone(),
            suppress_duplicates: settings.suppress_duplicates,
            context_lifetime: if settings.application_context {
                ContextLifetime::ApplicationWide
            } else {
                ContextLifetime::BoundToCaller
            },
            mime_policy: if settings.infer_mime {
                MimePolicy::Inferred
            } else {
                MimePolicy::default()
            },
        }
    }
}

/// One transfer, built per call and owned by the transfer task
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Correlates log lines of one transfer
    pub id: Uuid,
    pub source_path: PathBuf,
    pub name_prefix: String,
    pub suppress_duplicates: bool,
    pub mime_policy: MimePolicy,
}

impl TransferRequest {
    pub fn new(source_path: impl Into<PathBuf>, config: &SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_path: source_path.into(),
            name_prefix: config.name_prefix.clone(),
            suppress_duplicates: config.suppress_duplicates,
            mime_policy: config.mime_policy.clone(),
        }
    }

    /// `name_prefix + file_name`
    pub fn display_name(&self, file_name: &str) -> String {
        format!("{}{}", self.name_prefix, file_name)
    }
}

/// Computed destination metadata of a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTarget {
    /// Source file name
    pub title: String,
    /// Prefixed name under which the entry is stored
    pub display_name: String,
    pub mime_type: String,
    /// Execution time in milliseconds; used for taken, modified and added
    pub timestamp_ms: i64,
}

impl TransferTarget {
    pub fn new(request: &TransferRequest, file_name: &str, mime_type: String) -> Self {
        Self {
            title: file_name.to_string(),
            display_name: request.display_name(file_name),
            mime_type,
            timestamp_ms: gshare_common::time::now_millis(),
        }
    }
}
