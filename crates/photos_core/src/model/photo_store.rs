//! Per-user photo arena.
//!
//! # Responsibility
//! - Own the single canonical `Photo` instance for each normalized path.
//! - Let albums share photos by holding path keys into the store.
//!
//! # Invariants
//! - At most one photo per path.
//! - Interning a path that is already present keeps the existing instance.

use super::photo::Photo;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct PhotoStore {
    photos: BTreeMap<PathBuf, Photo>,
}

impl PhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&Photo> {
        self.photos.get(path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Photo> {
        self.photos.get_mut(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.photos.contains_key(path)
    }

    /// Registers `photo` and returns the canonical instance for its path.
    pub fn intern(&mut self, photo: Photo) -> &mut Photo {
        self.photos
            .entry(photo.path().to_path_buf())
            .or_insert(photo)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Photo> {
        self.photos.values()
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Drops every photo whose path is not in `referenced`; returns how many.
    pub(crate) fn retain_referenced(&mut self, referenced: &HashSet<&Path>) -> usize {
        let before = self.photos.len();
        self.photos.retain(|path, _| referenced.contains(path.as_path()));
        before - self.photos.len()
    }
}

/// Dumps as a list of photos; the path keys repeat inside each photo.
impl Serialize for PhotoStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.photos.values())
    }
}
