//! User domain model.
//!
//! # Responsibility
//! - Own the user's albums and the photo store those albums reference.
//! - Enforce per-user album name uniqueness.
//!
//! # Invariants
//! - `username` is trimmed and non-blank; identity ignores case.
//! - No two albums share a name, case-insensitively.
//! - Every path an album references has a photo in `photos`. Albums are
//!   only handed out by shared reference, so all album edits go through
//!   `User` and keep the store in step.

use super::album::{Album, AlbumView};
use super::error::ModelResult;
use super::photo::Photo;
use super::photo_store::PhotoStore;
use super::tag::Tag;
use super::{fold_case, names_match, require_name};
use log::debug;
use serde::Serialize;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    username: String,
    albums: Vec<Album>,
    photos: PhotoStore,
}

impl User {
    pub fn new(username: &str) -> ModelResult<Self> {
        Ok(Self {
            username: require_name(username, "username")?,
            albums: Vec::new(),
            photos: PhotoStore::new(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    /// Case-insensitive lookup by trimmed name.
    pub fn album(&self, name: &str) -> Option<&Album> {
        self.albums
            .iter()
            .find(|album| names_match(album.name(), name))
    }

    pub(crate) fn album_mut(&mut self, name: &str) -> Option<&mut Album> {
        self.albums
            .iter_mut()
            .find(|album| names_match(album.name(), name))
    }

    pub fn album_view(&self, name: &str) -> Option<AlbumView<'_>> {
        self.album(name)
            .map(|album| AlbumView::new(album, &self.photos))
    }

    /// Creates a new empty album.
    ///
    /// Returns `None` when `name` is blank or already used by another album.
    pub fn create_album(&mut self, name: &str) -> Option<&Album> {
        self.create_album_mut(name).map(|album| &*album)
    }

    pub(crate) fn create_album_mut(&mut self, name: &str) -> Option<&mut Album> {
        if self.album(name).is_some() {
            return None;
        }
        let album = Album::new(name).ok()?;
        self.albums.push(album);
        self.albums.last_mut()
    }

    /// Removes the album; photos no other album references are dropped too.
    pub fn delete_album(&mut self, name: &str) -> bool {
        let Some(index) = self.album_index(name) else {
            return false;
        };
        self.albums.remove(index);
        self.prune_unreferenced_photos();
        true
    }

    /// Renames `old_name` to `new_name` in place.
    ///
    /// Fails when `new_name` is blank, `old_name` is unknown, or `new_name`
    /// already belongs to a different album. Changing only the case of the
    /// album's own name is allowed.
    pub fn rename_album(&mut self, old_name: &str, new_name: &str) -> bool {
        if new_name.trim().is_empty() {
            return false;
        }
        let Some(index) = self.album_index(old_name) else {
            return false;
        };
        let conflict = self
            .albums
            .iter()
            .enumerate()
            .any(|(other, album)| other != index && names_match(album.name(), new_name));
        if conflict {
            return false;
        }
        self.albums[index].rename(new_name).is_ok()
    }

    pub fn photos(&self) -> &PhotoStore {
        &self.photos
    }

    pub(crate) fn photos_mut(&mut self) -> &mut PhotoStore {
        &mut self.photos
    }

    pub fn photo(&self, path: &Path) -> Option<&Photo> {
        self.photos.get(path)
    }

    /// Mutable access to the shared instance; edits show in every album.
    pub fn photo_mut(&mut self, path: &Path) -> Option<&mut Photo> {
        self.photos.get_mut(path)
    }

    /// Registers `photo` in the store and appends it to the named album.
    ///
    /// A photo whose path is already known keeps the existing instance, so
    /// its caption and tags carry over. Returns `None` when the album does
    /// not exist, `Some(false)` when the album already holds the photo.
    pub fn add_photo_to_album(&mut self, album_name: &str, photo: Photo) -> Option<bool> {
        let index = self.album_index(album_name)?;
        let canonical = self.photos.intern(photo);
        Some(self.albums[index].add_path(canonical.path()))
    }

    /// Removes the photo reference; the photo is dropped from the store once
    /// no album references it. The backing file is never touched.
    pub fn remove_photo_from_album(&mut self, album_name: &str, path: &Path) -> bool {
        let Some(album) = self.album_mut(album_name) else {
            return false;
        };
        if !album.remove_path(path) {
            return false;
        }
        self.prune_unreferenced_photos();
        true
    }

    /// Distinct photos carrying `tag`, in album order.
    pub fn photos_with_tag(&self, tag: &Tag) -> Vec<&Photo> {
        let mut seen = HashSet::new();
        self.albums
            .iter()
            .flat_map(|album| album.photo_paths().iter())
            .filter(|path| seen.insert(path.as_path()))
            .filter_map(|path| self.photos.get(path))
            .filter(|photo| photo.has_tag(tag))
            .collect()
    }

    fn album_index(&self, name: &str) -> Option<usize> {
        self.albums
            .iter()
            .position(|album| names_match(album.name(), name))
    }

    fn prune_unreferenced_photos(&mut self) {
        let referenced: HashSet<&Path> = self
            .albums
            .iter()
            .flat_map(|album| album.photo_paths().iter().map(|path| path.as_path()))
            .collect();
        let dropped = self.photos.retain_referenced(&referenced);
        if dropped > 0 {
            debug!("event=photo_prune module=model status=ok dropped={dropped}");
        }
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        fold_case(&self.username) == fold_case(&other.username)
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        fold_case(&self.username).hash(state);
    }
}
