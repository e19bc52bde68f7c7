//! Snapshot persistence for the model tree.
//!
//! # Responsibility
//! - Map the in-memory tree to snapshot tables and back.
//! - Own the file-level load/save policy (`UserManager::load_from_file`,
//!   `UserManager::save_to_file`).
//!
//! # Invariants
//! - Snapshot writes never leave a partially written target file.
//! - Loading never fails the caller; causes are logged and an empty tree is
//!   returned instead.

pub mod snapshot_file;
pub mod snapshot_repo;
