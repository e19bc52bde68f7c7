//! Snapshot repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Write the complete `UserManager` tree into snapshot tables.
//! - Rebuild a `UserManager` from snapshot tables through the model APIs, so
//!   every model invariant is re-checked on load.
//!
//! # Invariants
//! - A write replaces all snapshot rows inside one transaction.
//! - User, album, album-photo and tag order round-trip through `sort_order`.
//! - Each photo is stored once per user; albums reference it by `photo_id`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::error::ModelError;
use crate::model::photo::Photo;
use crate::model::tag::Tag;
use crate::model::user::User;
use crate::model::user_manager::UserManager;
use chrono::{DateTime, Local, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Value of the `format` key in `snapshot_meta`.
pub const SNAPSHOT_FORMAT: &str = "photos-snapshot";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Model(ModelError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Model(err) => write!(f, "invalid persisted model data: {err}"),
            Self::InvalidData(message) => write!(f, "invalid snapshot data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Model(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ModelError> for RepoError {
    fn from(value: ModelError) -> Self {
        Self::Model(value)
    }
}

/// Row counts produced by one snapshot write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub snapshot_id: Uuid,
    pub users: usize,
    pub albums: usize,
    pub photos: usize,
    pub tags: usize,
}

/// Repository interface for whole-tree snapshot persistence.
pub trait SnapshotRepository {
    /// Replaces the stored snapshot with `manager`.
    fn write_manager(&mut self, manager: &UserManager) -> RepoResult<SnapshotSummary>;
    /// Rebuilds the stored snapshot.
    fn read_manager(&self) -> RepoResult<UserManager>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Wraps a connection whose schema is already current.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn write_manager(&mut self, manager: &UserManager) -> RepoResult<SnapshotSummary> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute_batch(
            "DELETE FROM photo_tags;
             DELETE FROM album_photos;
             DELETE FROM albums;
             DELETE FROM photos;
             DELETE FROM users;
             DELETE FROM snapshot_meta;",
        )?;

        let mut summary = SnapshotSummary {
            snapshot_id: Uuid::new_v4(),
            users: 0,
            albums: 0,
            photos: 0,
            tags: 0,
        };
        write_meta(&tx, summary.snapshot_id)?;

        for (user_order, user) in manager.users().iter().enumerate() {
            tx.execute(
                "INSERT INTO users (username, sort_order) VALUES (?1, ?2);",
                params![user.username(), to_sort_order(user_order)],
            )?;
            let user_id = tx.last_insert_rowid();
            summary.users += 1;
            write_user_albums(&tx, user_id, user, &mut summary)?;
        }

        tx.commit()?;
        Ok(summary)
    }

    fn read_manager(&self) -> RepoResult<UserManager> {
        let conn: &Connection = &*self.conn;
        ensure_snapshot_format(conn)?;

        let mut stmt =
            conn.prepare("SELECT user_id, username FROM users ORDER BY sort_order, user_id;")?;
        let user_rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut manager = UserManager::new();
        for (user_id, username) in user_rows {
            let user = manager.add_user(&username).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "users row {user_id} has a blank or duplicate username"
                ))
            })?;
            let photo_paths = read_user_photos(conn, user_id, user)?;
            read_user_albums(conn, user_id, user, &photo_paths)?;
        }

        Ok(manager)
    }
}

fn write_meta(tx: &Transaction<'_>, snapshot_id: Uuid) -> RepoResult<()> {
    let entries = [
        ("format", SNAPSHOT_FORMAT.to_string()),
        ("snapshot_id", snapshot_id.to_string()),
        ("core_version", env!("CARGO_PKG_VERSION").to_string()),
        ("written_at", Utc::now().to_rfc3339()),
    ];
    for (key, value) in entries {
        tx.execute(
            "INSERT INTO snapshot_meta (key, value) VALUES (?1, ?2);",
            params![key, value],
        )?;
    }
    Ok(())
}

fn write_user_albums(
    tx: &Transaction<'_>,
    user_id: i64,
    user: &User,
    summary: &mut SnapshotSummary,
) -> RepoResult<()> {
    let mut photo_ids: HashMap<&Path, i64> = HashMap::new();

    for (album_order, album) in user.albums().iter().enumerate() {
        tx.execute(
            "INSERT INTO albums (user_id, name, sort_order) VALUES (?1, ?2, ?3);",
            params![user_id, album.name(), to_sort_order(album_order)],
        )?;
        let album_id = tx.last_insert_rowid();
        summary.albums += 1;

        for (photo_order, path) in album.photo_paths().iter().enumerate() {
            let photo_id = match photo_ids.get(path.as_path()) {
                Some(photo_id) => *photo_id,
                None => {
                    let photo = user.photo(path).ok_or_else(|| {
                        RepoError::InvalidData(format!(
                            "album `{}` references a photo missing from the store",
                            album.name()
                        ))
                    })?;
                    let photo_id = write_photo(tx, user_id, photo, summary)?;
                    photo_ids.insert(path.as_path(), photo_id);
                    photo_id
                }
            };
            tx.execute(
                "INSERT INTO album_photos (album_id, photo_id, sort_order) VALUES (?1, ?2, ?3);",
                params![album_id, photo_id, to_sort_order(photo_order)],
            )?;
        }
    }

    Ok(())
}

fn write_photo(
    tx: &Transaction<'_>,
    user_id: i64,
    photo: &Photo,
    summary: &mut SnapshotSummary,
) -> RepoResult<i64> {
    let path = path_to_bytes(photo.path());
    tx.execute(
        "INSERT INTO photos (user_id, path, caption, captured_at_ms) VALUES (?1, ?2, ?3, ?4);",
        params![
            user_id,
            path,
            photo.caption(),
            photo.captured_at().map(|at| at.timestamp_millis()),
        ],
    )?;
    let photo_id = tx.last_insert_rowid();
    summary.photos += 1;

    for (tag_order, tag) in photo.tags().iter().enumerate() {
        tx.execute(
            "INSERT INTO photo_tags (photo_id, name, value, sort_order) VALUES (?1, ?2, ?3, ?4);",
            params![photo_id, tag.name(), tag.value(), to_sort_order(tag_order)],
        )?;
        summary.tags += 1;
    }

    Ok(photo_id)
}

fn ensure_snapshot_format(conn: &Connection) -> RepoResult<()> {
    let format: Option<String> = conn
        .query_row(
            "SELECT value FROM snapshot_meta WHERE key = 'format';",
            [],
            |row| row.get(0),
        )
        .optional()?;
    match format.as_deref() {
        Some(SNAPSHOT_FORMAT) => Ok(()),
        Some(other) => Err(RepoError::InvalidData(format!(
            "unexpected snapshot format `{other}`"
        ))),
        None => Err(RepoError::InvalidData(
            "snapshot_meta has no format marker".to_string(),
        )),
    }
}

fn read_user_photos(
    conn: &Connection,
    user_id: i64,
    user: &mut User,
) -> RepoResult<HashMap<i64, PathBuf>> {
    let mut stmt = conn.prepare(
        "SELECT photo_id, path, caption, captured_at_ms
         FROM photos
         WHERE user_id = ?1
         ORDER BY photo_id;",
    )?;
    let rows = stmt
        .query_map([user_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<i64>>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut paths = HashMap::with_capacity(rows.len());
    for (photo_id, path_bytes, caption, captured_at_ms) in rows {
        let path = path_from_bytes(photo_id, path_bytes)?;
        if !path.is_absolute() {
            return Err(RepoError::InvalidData(format!(
                "photos row {photo_id} has a blank or relative path"
            )));
        }
        let captured_at = captured_at_ms
            .map(|millis| parse_captured_at(photo_id, millis))
            .transpose()?;

        let mut photo = Photo::restore(path.clone(), &caption, captured_at);
        for tag in read_photo_tags(conn, photo_id)? {
            if !photo.add_tag(tag) {
                return Err(RepoError::InvalidData(format!(
                    "photos row {photo_id} has duplicate tags"
                )));
            }
        }
        if user.photos().contains(&path) {
            return Err(RepoError::InvalidData(format!(
                "photos row {photo_id} repeats a path for the same user"
            )));
        }
        user.photos_mut().intern(photo);
        paths.insert(photo_id, path);
    }

    Ok(paths)
}

fn read_photo_tags(conn: &Connection, photo_id: i64) -> RepoResult<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT name, value FROM photo_tags WHERE photo_id = ?1 ORDER BY sort_order, rowid;",
    )?;
    let rows = stmt
        .query_map([photo_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut tags = Vec::with_capacity(rows.len());
    for (name, value) in rows {
        tags.push(Tag::new(&name, &value)?);
    }
    Ok(tags)
}

fn read_user_albums(
    conn: &Connection,
    user_id: i64,
    user: &mut User,
    photo_paths: &HashMap<i64, PathBuf>,
) -> RepoResult<()> {
    let mut album_stmt = conn.prepare(
        "SELECT album_id, name FROM albums WHERE user_id = ?1 ORDER BY sort_order, album_id;",
    )?;
    let albums = album_stmt
        .query_map([user_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut ref_stmt = conn.prepare(
        "SELECT photo_id FROM album_photos WHERE album_id = ?1 ORDER BY sort_order, rowid;",
    )?;
    for (album_id, name) in albums {
        let photo_ids = ref_stmt
            .query_map([album_id], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let album = user.create_album_mut(&name).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "albums row {album_id} has a blank or duplicate name"
            ))
        })?;
        for photo_id in photo_ids {
            let path = photo_paths.get(&photo_id).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "album {album_id} references photo {photo_id} of another user or none"
                ))
            })?;
            if !album.add_path(path) {
                return Err(RepoError::InvalidData(format!(
                    "album {album_id} references photo {photo_id} twice"
                )));
            }
        }
    }

    Ok(())
}

fn parse_captured_at(photo_id: i64, millis: i64) -> RepoResult<DateTime<Local>> {
    Local.timestamp_millis_opt(millis).single().ok_or_else(|| {
        RepoError::InvalidData(format!(
            "photos row {photo_id} has an out-of-range captured_at_ms"
        ))
    })
}

/// Raw OS bytes of `path`, so any name the filesystem accepts round-trips.
#[cfg(unix)]
fn path_to_bytes(path: &Path) -> &[u8] {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes()
}

#[cfg(not(unix))]
fn path_to_bytes(path: &Path) -> &[u8] {
    path.as_os_str().as_encoded_bytes()
}

#[cfg(unix)]
fn path_from_bytes(_photo_id: i64, bytes: Vec<u8>) -> RepoResult<PathBuf> {
    use std::os::unix::ffi::OsStringExt;
    Ok(PathBuf::from(std::ffi::OsString::from_vec(bytes)))
}

#[cfg(not(unix))]
fn path_from_bytes(photo_id: i64, bytes: Vec<u8>) -> RepoResult<PathBuf> {
    String::from_utf8(bytes).map(PathBuf::from).map_err(|_| {
        RepoError::InvalidData(format!("photos row {photo_id} has a non-UTF-8 path"))
    })
}

fn to_sort_order(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::{RepoError, SnapshotRepository, SqliteSnapshotRepository};
    use crate::db::open_db_in_memory;
    use crate::model::user_manager::UserManager;
    use std::path::Path;

    #[test]
    fn write_rejects_album_reference_without_stored_photo() {
        let mut manager = UserManager::new();
        manager.add_user("alice").unwrap().create_album("Trip").unwrap();
        let mut conn = open_db_in_memory().unwrap();
        let mut repo = SqliteSnapshotRepository::new(&mut conn);
        repo.write_manager(&manager).unwrap();

        let alice = manager.user_mut("alice").unwrap();
        alice
            .album_mut("Trip")
            .unwrap()
            .add_path(Path::new("/photos/ghost.jpg"));

        let err = repo.write_manager(&manager).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)), "got {err}");

        let previous = repo.read_manager().unwrap();
        let trip = previous.user("alice").unwrap().album("Trip").unwrap();
        assert!(trip.is_empty());
    }
}
