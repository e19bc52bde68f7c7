//! Album domain model.
//!
//! # Responsibility
//! - Keep an ordered list of photo references (path keys into the owning
//!   user's `PhotoStore`).
//! - Derive the album date range from the referenced photos.
//!
//! # Invariants
//! - `name` is trimmed and non-blank; identity ignores case.
//! - `photos` keeps insertion order and never repeats a path.
//! - Cross-album name uniqueness is enforced by `User`, not here.
//! - A `User` never exposes its albums mutably; `add_photo` and friends
//!   apply to standalone albums only.

use super::error::ModelResult;
use super::photo::Photo;
use super::photo_store::PhotoStore;
use super::{fold_case, require_name};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

const DATE_RANGE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Serialize)]
pub struct Album {
    name: String,
    #[serde(serialize_with = "super::serialize_paths_lossy")]
    photos: Vec<PathBuf>,
}

impl Album {
    pub fn new(name: &str) -> ModelResult<Self> {
        Ok(Self {
            name: require_name(name, "album name")?,
            photos: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, new_name: &str) -> ModelResult<()> {
        self.name = require_name(new_name, "album name")?;
        Ok(())
    }

    /// Photo paths in album order.
    pub fn photo_paths(&self) -> &[PathBuf] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Appends a reference to `photo` unless the album already has it.
    ///
    /// Only the path is recorded. Photos for a user's album go through
    /// `User::add_photo_to_album`, which also registers them in the store.
    pub fn add_photo(&mut self, photo: &Photo) -> bool {
        self.add_path(photo.path())
    }

    pub fn remove_photo(&mut self, photo: &Photo) -> bool {
        self.remove_path(photo.path())
    }

    pub fn contains_photo(&self, photo: &Photo) -> bool {
        self.contains_path(photo.path())
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.photos.iter().any(|existing| existing == path)
    }

    pub(crate) fn add_path(&mut self, path: &Path) -> bool {
        if self.contains_path(path) {
            return false;
        }
        self.photos.push(path.to_path_buf());
        true
    }

    pub(crate) fn remove_path(&mut self, path: &Path) -> bool {
        match self.photos.iter().position(|existing| existing == path) {
            Some(index) => {
                self.photos.remove(index);
                true
            }
            None => false,
        }
    }

    /// Earliest capture time among referenced photos that have one.
    pub fn earliest_date(&self, store: &PhotoStore) -> Option<DateTime<Local>> {
        self.captured_dates(store).min()
    }

    /// Latest capture time among referenced photos that have one.
    pub fn latest_date(&self, store: &PhotoStore) -> Option<DateTime<Local>> {
        self.captured_dates(store).max()
    }

    /// `"<earliest> - <latest>"` as `yyyy-MM-dd`, or empty without dates.
    pub fn formatted_date_range(&self, store: &PhotoStore) -> String {
        match (self.earliest_date(store), self.latest_date(store)) {
            (Some(earliest), Some(latest)) => format!(
                "{} - {}",
                earliest.format(DATE_RANGE_FORMAT),
                latest.format(DATE_RANGE_FORMAT)
            ),
            _ => String::new(),
        }
    }

    fn captured_dates<'a>(
        &'a self,
        store: &'a PhotoStore,
    ) -> impl Iterator<Item = DateTime<Local>> + 'a {
        self.photos
            .iter()
            .filter_map(|path| store.get(path))
            .filter_map(Photo::captured_at)
    }
}

impl PartialEq for Album {
    fn eq(&self, other: &Self) -> bool {
        fold_case(&self.name) == fold_case(&other.name)
    }
}

impl Eq for Album {}

impl Hash for Album {
    fn hash<H: Hasher>(&self, state: &mut H) {
        fold_case(&self.name).hash(state);
    }
}

/// Read-only pairing of an album with the store its paths point into.
#[derive(Debug, Clone, Copy)]
pub struct AlbumView<'a> {
    album: &'a Album,
    store: &'a PhotoStore,
}

impl<'a> AlbumView<'a> {
    pub fn new(album: &'a Album, store: &'a PhotoStore) -> Self {
        Self { album, store }
    }

    pub fn album(&self) -> &'a Album {
        self.album
    }

    pub fn name(&self) -> &'a str {
        self.album.name()
    }

    /// Resolved photos in album order; unknown paths are skipped.
    pub fn photos(&self) -> impl Iterator<Item = &'a Photo> + 'a {
        let store = self.store;
        self.album
            .photo_paths()
            .iter()
            .filter_map(move |path| store.get(path))
    }

    pub fn earliest_date(&self) -> Option<DateTime<Local>> {
        self.album.earliest_date(self.store)
    }

    pub fn latest_date(&self) -> Option<DateTime<Local>> {
        self.album.latest_date(self.store)
    }

    pub fn formatted_date_range(&self) -> String {
        self.album.formatted_date_range(self.store)
    }
}
