//! gshare-album library
//!
//! Copies one local image or video into a platform-managed shared media
//! store. A transfer is gated behind a runtime permission, optionally
//! suppressed when the display name is already indexed, executed off the
//! caller's task, and reported through exactly one terminal callback.
//!
//! Entry point is [`ShareSession`]; the platform collaborators (permission
//! subsystem, media index) are traits in [`platform`] with reference
//! implementations in [`index`].

pub mod error;
pub mod index;
pub mod listener;
pub mod models;
pub mod platform;
pub mod services;
pub mod session;

pub use crate::error::{TransferError, TransferErrorKind};
pub use crate::listener::{EventBusListener, ShareListener};
pub use crate::models::{ContextLifetime, MimePolicy, SessionConfig, TransferRequest, TransferResult};
pub use crate::platform::{Capability, MediaIndex, PermissionProvider, Platform};
pub use crate::session::{ShareSession, TransferHandle};
