//! Photo library use-case service.
//!
//! # Responsibility
//! - Load the snapshot at startup and guarantee the built-in accounts.
//! - Turn model `Option`/`bool` results into user-facing error variants.
//! - Save the snapshot after every successful mutation.
//!
//! # Invariants
//! - The `admin` account can never be deleted.
//! - A rejected request changes nothing and writes nothing.
//! - A failed save is reported; the in-memory change is kept.

use crate::config::AppConfig;
use crate::model::error::ModelError;
use crate::model::names_match;
use crate::model::photo::{normalize_path, Photo};
use crate::model::tag::Tag;
use crate::model::user::User;
use crate::model::user_manager::{UserManager, ADMIN_USERNAME};
use crate::repo::snapshot_file::SnapshotError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type ServiceResult<T> = Result<T, LibraryServiceError>;

/// Errors from library service operations.
#[derive(Debug)]
pub enum LibraryServiceError {
    /// A required field is blank after trim.
    InvalidInput(&'static str),
    UnknownUser(String),
    UserExists(String),
    /// The account is built in and cannot be removed.
    ProtectedUser(String),
    AlbumNotFound(String),
    AlbumExists(String),
    PhotoNotFound(PathBuf),
    /// The photo already carries an equal tag.
    DuplicateTag,
    TagNotFound,
    Model(ModelError),
    Snapshot(SnapshotError),
}

impl Display for LibraryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(field) => write!(f, "{field} must not be blank"),
            Self::UnknownUser(name) => write!(f, "user does not exist: {name}"),
            Self::UserExists(name) => write!(f, "user already exists: {name}"),
            Self::ProtectedUser(name) => write!(f, "user cannot be deleted: {name}"),
            Self::AlbumNotFound(name) => write!(f, "album does not exist: {name}"),
            Self::AlbumExists(name) => write!(f, "album name already in use: {name}"),
            Self::PhotoNotFound(path) => write!(f, "photo not in library: {}", path.display()),
            Self::DuplicateTag => write!(f, "tag already exists for this photo"),
            Self::TagNotFound => write!(f, "tag is not attached to this photo"),
            Self::Model(err) => write!(f, "{err}"),
            Self::Snapshot(err) => write!(f, "failed to save library: {err}"),
        }
    }
}

impl Error for LibraryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Model(err) => Some(err),
            Self::Snapshot(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelError> for LibraryServiceError {
    fn from(value: ModelError) -> Self {
        match value {
            ModelError::InvalidArgument { field } => Self::InvalidInput(field),
            other => Self::Model(other),
        }
    }
}

impl From<SnapshotError> for LibraryServiceError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

/// Who is logged in after a successful `login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// The administrator; manages accounts only.
    Admin,
    /// A regular user, carrying the stored username.
    User(String),
}

/// Library service facade over the model tree and its snapshot file.
pub struct LibraryService {
    manager: UserManager,
    snapshot_path: PathBuf,
}

impl LibraryService {
    /// Loads the configured snapshot and ensures the built-in accounts.
    pub fn open(config: &AppConfig) -> Self {
        Self::open_at(&config.snapshot_path)
    }

    pub fn open_at(snapshot_path: impl AsRef<Path>) -> Self {
        let snapshot_path = snapshot_path.as_ref().to_path_buf();
        let mut manager = UserManager::load_from_file(&snapshot_path);
        manager.ensure_built_in_users();
        info!(
            "event=library_open module=service status=ok users={}",
            manager.users().len()
        );
        Self {
            manager,
            snapshot_path,
        }
    }

    pub fn manager(&self) -> &UserManager {
        &self.manager
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Writes the whole tree to the snapshot path.
    pub fn save(&self) -> ServiceResult<()> {
        self.manager.save_to_file(&self.snapshot_path)?;
        Ok(())
    }

    pub fn login(&self, username: &str) -> ServiceResult<Session> {
        let username = require(username, "username")?;
        let user = self
            .manager
            .user(username)
            .ok_or_else(|| LibraryServiceError::UnknownUser(username.to_string()))?;
        if names_match(user.username(), ADMIN_USERNAME) {
            return Ok(Session::Admin);
        }
        Ok(Session::User(user.username().to_string()))
    }

    pub fn add_user(&mut self, username: &str) -> ServiceResult<()> {
        let username = require(username, "username")?;
        if self.manager.add_user(username).is_none() {
            return Err(LibraryServiceError::UserExists(username.to_string()));
        }
        self.save()
    }

    pub fn delete_user(&mut self, username: &str) -> ServiceResult<()> {
        let username = require(username, "username")?;
        if names_match(ADMIN_USERNAME, username) {
            return Err(LibraryServiceError::ProtectedUser(username.to_string()));
        }
        if !self.manager.delete_user(username) {
            return Err(LibraryServiceError::UnknownUser(username.to_string()));
        }
        self.save()
    }

    pub fn create_album(&mut self, username: &str, album_name: &str) -> ServiceResult<()> {
        let album_name = require(album_name, "album name")?;
        let user = self.user_mut(username)?;
        if user.create_album(album_name).is_none() {
            return Err(LibraryServiceError::AlbumExists(album_name.to_string()));
        }
        self.save()
    }

    pub fn rename_album(
        &mut self,
        username: &str,
        old_name: &str,
        new_name: &str,
    ) -> ServiceResult<()> {
        let new_name = require(new_name, "album name")?;
        let user = self.user_mut(username)?;
        if user.album(old_name).is_none() {
            return Err(LibraryServiceError::AlbumNotFound(old_name.trim().to_string()));
        }
        if !user.rename_album(old_name, new_name) {
            return Err(LibraryServiceError::AlbumExists(new_name.to_string()));
        }
        self.save()
    }

    pub fn delete_album(&mut self, username: &str, album_name: &str) -> ServiceResult<()> {
        let user = self.user_mut(username)?;
        if !user.delete_album(album_name) {
            return Err(LibraryServiceError::AlbumNotFound(album_name.trim().to_string()));
        }
        self.save()
    }

    /// Adds the file at `path` to an album.
    ///
    /// Returns `Ok(false)` without saving when the album already holds it.
    pub fn import_photo(
        &mut self,
        username: &str,
        album_name: &str,
        path: impl AsRef<Path>,
    ) -> ServiceResult<bool> {
        let user = self.user_mut(username)?;
        if user.album(album_name).is_none() {
            return Err(LibraryServiceError::AlbumNotFound(album_name.trim().to_string()));
        }
        let photo = Photo::new(path)?;
        let added = user
            .add_photo_to_album(album_name, photo)
            .ok_or_else(|| LibraryServiceError::AlbumNotFound(album_name.trim().to_string()))?;
        if added {
            self.save()?;
        }
        Ok(added)
    }

    pub fn remove_photo(
        &mut self,
        username: &str,
        album_name: &str,
        path: impl AsRef<Path>,
    ) -> ServiceResult<()> {
        let path = normalize_path(path.as_ref())?;
        let user = self.user_mut(username)?;
        if user.album(album_name).is_none() {
            return Err(LibraryServiceError::AlbumNotFound(album_name.trim().to_string()));
        }
        if !user.remove_photo_from_album(album_name, &path) {
            return Err(LibraryServiceError::PhotoNotFound(path));
        }
        self.save()
    }

    pub fn set_caption(
        &mut self,
        username: &str,
        path: impl AsRef<Path>,
        caption: &str,
    ) -> ServiceResult<()> {
        let photo = self.photo_mut(username, path.as_ref())?;
        photo.set_caption(caption);
        self.save()
    }

    pub fn add_tag(
        &mut self,
        username: &str,
        path: impl AsRef<Path>,
        name: &str,
        value: &str,
    ) -> ServiceResult<()> {
        let tag = Tag::new(name, value)?;
        let photo = self.photo_mut(username, path.as_ref())?;
        if !photo.add_tag(tag) {
            return Err(LibraryServiceError::DuplicateTag);
        }
        self.save()
    }

    pub fn remove_tag(
        &mut self,
        username: &str,
        path: impl AsRef<Path>,
        name: &str,
        value: &str,
    ) -> ServiceResult<()> {
        let tag = Tag::new(name, value)?;
        let photo = self.photo_mut(username, path.as_ref())?;
        if !photo.remove_tag(&tag) {
            return Err(LibraryServiceError::TagNotFound);
        }
        self.save()
    }

    fn user_mut(&mut self, username: &str) -> ServiceResult<&mut User> {
        self.manager
            .user_mut(username)
            .ok_or_else(|| LibraryServiceError::UnknownUser(username.trim().to_string()))
    }

    fn photo_mut(&mut self, username: &str, path: &Path) -> ServiceResult<&mut Photo> {
        let path = normalize_path(path)?;
        let user = self.user_mut(username)?;
        user.photo_mut(&path)
            .ok_or(LibraryServiceError::PhotoNotFound(path))
    }
}

fn require<'a>(value: &'a str, field: &'static str) -> ServiceResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LibraryServiceError::InvalidInput(field));
    }
    Ok(trimmed)
}
