//! Photo domain model.
//!
//! # Responsibility
//! - Bind a photo to its backing file by normalized absolute path.
//! - Hold the user-editable caption and tag set.
//!
//! # Invariants
//! - `path` is absolute, lexically normalized, and never changes.
//! - Equality and hashing use `path` only.
//! - `tags` never holds two tags that compare equal.
//! - `caption` is always stored trimmed.

use super::error::{ModelError, ModelResult};
use super::tag::Tag;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

const CAPTURED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Serialize)]
pub struct Photo {
    #[serde(serialize_with = "super::serialize_path_lossy")]
    path: PathBuf,
    caption: String,
    captured_at: Option<DateTime<Local>>,
    tags: Vec<Tag>,
}

impl Photo {
    /// Creates a photo for an existing file.
    ///
    /// The capture timestamp is read from the file's last-modified time.
    ///
    /// # Errors
    /// - `InvalidArgument` when `path` is blank.
    /// - `Io` when the file does not exist or its metadata cannot be read.
    pub fn new(path: impl AsRef<Path>) -> ModelResult<Self> {
        let raw = path.as_ref();
        if raw.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(ModelError::InvalidArgument { field: "photo path" });
        }

        let path = normalize_path(raw)?;
        let mut photo = Self {
            path,
            caption: String::new(),
            captured_at: None,
            tags: Vec::new(),
        };
        photo.refresh_captured_at()?;
        Ok(photo)
    }

    /// Rebuilds a photo from persisted fields without touching the filesystem.
    pub(crate) fn restore(
        path: PathBuf,
        caption: &str,
        captured_at: Option<DateTime<Local>>,
    ) -> Self {
        Self {
            path,
            caption: caption.trim().to_string(),
            captured_at,
            tags: Vec::new(),
        }
    }

    /// Re-reads the backing file's last-modified time.
    pub fn refresh_captured_at(&mut self) -> ModelResult<()> {
        let metadata =
            std::fs::metadata(&self.path).map_err(|err| ModelError::io(&self.path, err))?;
        let modified = metadata
            .modified()
            .map_err(|err| ModelError::io(&self.path, err))?;
        self.captured_at = Some(DateTime::<Local>::from(modified));
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Stores the trimmed caption; an empty string clears it.
    pub fn set_caption(&mut self, caption: &str) {
        self.caption = caption.trim().to_string();
    }

    pub fn captured_at(&self) -> Option<DateTime<Local>> {
        self.captured_at
    }

    /// `yyyy-MM-dd HH:mm:ss` in local time, or an empty string without a date.
    pub fn formatted_captured_at(&self) -> String {
        self.captured_at
            .map(|at| at.format(CAPTURED_AT_FORMAT).to_string())
            .unwrap_or_default()
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// Adds `tag` unless an equal tag is already attached.
    pub fn add_tag(&mut self, tag: Tag) -> bool {
        if self.has_tag(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn remove_tag(&mut self, tag: &Tag) -> bool {
        match self.tags.iter().position(|existing| existing == tag) {
            Some(index) => {
                self.tags.remove(index);
                true
            }
            None => false,
        }
    }
}

impl PartialEq for Photo {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Photo {}

impl Hash for Photo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// Makes `raw` absolute and folds `.`/`..` components without following links.
pub fn normalize_path(raw: &Path) -> ModelResult<PathBuf> {
    let absolute = std::path::absolute(raw).map_err(|err| ModelError::io(raw, err))?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}
