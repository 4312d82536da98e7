//! Data model for share sessions and transfers

pub mod request;
pub mod result;

pub use request::{
    ContextLifetime, MimePolicy, SessionConfig, TransferRequest, TransferTarget,
    DEFAULT_MIME_TYPE, DEFAULT_NAME_PREFIX, FALLBACK_MIME_TYPE,
};
pub use result::TransferResult;
