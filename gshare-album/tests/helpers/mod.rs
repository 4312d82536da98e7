//! Test Helper Utilities
//!
//! Shared utilities for testing gshare-album

#![allow(dead_code)]

pub mod fixtures;
pub mod listeners;
pub mod permissions;

// Re-export commonly used items
pub use fixtures::{sample_bytes, TestEnv};
pub use listeners::{Callback, PanicOnStartListener, RecordingListener};
pub use permissions::{DeferredPermissions, ScriptedPermissions};
