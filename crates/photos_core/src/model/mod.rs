//! In-memory photo library model.
//!
//! # Responsibility
//! - Define the ownership tree `UserManager -> User -> Album -> Photo`.
//! - Enforce name validation and case-insensitive uniqueness at every level.
//!
//! # Invariants
//! - Required names are trimmed and never blank.
//! - Tag, album and user identity compare case-insensitively.
//! - Photo identity is its normalized absolute path.
//! - Each user owns one `PhotoStore`; albums reference photos by path, so a
//!   photo shared by several albums is a single instance.

pub mod album;
pub mod error;
pub mod photo;
pub mod photo_store;
pub mod tag;
pub mod user;
pub mod user_manager;

use error::{ModelError, ModelResult};
use serde::Serializer;
use std::path::{Path, PathBuf};

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn require_name(value: &str, field: &'static str) -> ModelResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModelError::InvalidArgument { field });
    }
    Ok(trimmed.to_string())
}

/// Case-folded form used for identity comparisons and hashing.
pub(crate) fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// Case-insensitive comparison of an already-trimmed name with raw input.
pub(crate) fn names_match(stored: &str, candidate: &str) -> bool {
    fold_case(stored) == fold_case(candidate.trim())
}

/// Writes a path as text for dumps; bytes that are not UTF-8 are replaced.
pub(crate) fn serialize_path_lossy<S: Serializer>(
    path: &Path,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

pub(crate) fn serialize_paths_lossy<S: Serializer>(
    paths: &[PathBuf],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(paths.iter().map(|path| path.to_string_lossy()))
}
