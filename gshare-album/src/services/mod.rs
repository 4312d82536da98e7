//! Transfer pipeline services
//!
//! Leaf to root: path validation, duplicate checking, strategy selection,
//! the two storage strategies, the permission gate and the worker that
//! ties them together.

pub mod duplicate_checker;
pub mod indexed_insert;
pub mod legacy_copy;
pub mod path_validator;
pub mod permission_gate;
pub mod strategy;
pub mod transfer_worker;

pub use duplicate_checker::DuplicateChecker;
pub use indexed_insert::IndexedInsertStrategy;
pub use legacy_copy::LegacyDirectCopyStrategy;
pub use path_validator::{PathValidator, ValidatedSource};
pub use permission_gate::PermissionGate;
pub use strategy::{copy_stream, StorageStrategy, StoredMedia, StrategyKind, COPY_BUFFER_SIZE};
pub use transfer_worker::TransferWorker;
