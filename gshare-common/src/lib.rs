//! # GShare Common Library
//!
//! Shared code for the GShare crates:
//! - Error type and result alias
//! - TOML bootstrap configuration and root folder resolution
//! - Transfer lifecycle events and the EventBus
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
pub use events::{EventBus, ShareEvent};
