//! File-level snapshot load/save.
//!
//! # Responsibility
//! - Write the whole tree to a temporary file next to the target, then
//!   rename it over the target.
//! - Load a snapshot, degrading to an empty tree on any failure.
//!
//! # Invariants
//! - A failed save leaves the previous snapshot file untouched.
//! - A missing snapshot file is not an error.

use super::snapshot_repo::{
    RepoError, SnapshotRepository, SnapshotSummary, SqliteSnapshotRepository,
};
use crate::db::{open_db, open_db_read_only};
use crate::model::user_manager::UserManager;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

const TEMP_PREFIX: &str = ".photos-snapshot-";
const TEMP_SUFFIX: &str = ".tmp";

#[derive(Debug)]
pub enum SnapshotError {
    /// Filesystem failure while creating directories, temp file or rename.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Database or content failure while writing/reading snapshot rows.
    Repo(RepoError),
}

impl SnapshotError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "snapshot_io_failed",
            Self::Repo(RepoError::Db(_)) => "snapshot_db_failed",
            Self::Repo(_) => "snapshot_invalid_data",
        }
    }
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "snapshot I/O failed at `{}`: {source}", path.display())
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for SnapshotError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl UserManager {
    /// Loads the snapshot at `path`.
    ///
    /// Never fails: a missing file yields an empty manager, and an unreadable
    /// or invalid file is logged at `warn` and also yields an empty manager.
    pub fn load_from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load_from_file(path) {
            Ok(Some(manager)) => manager,
            Ok(None) => {
                info!(
                    "event=snapshot_load module=repo status=missing path={}",
                    path.display()
                );
                Self::new()
            }
            Err(err) => {
                warn!(
                    "event=snapshot_load module=repo status=fallback_empty path={} error_code={} error={}",
                    path.display(),
                    err.code(),
                    err
                );
                Self::new()
            }
        }
    }

    /// Loads the snapshot at `path`, exposing the failure cause.
    ///
    /// Returns `Ok(None)` when no file exists at `path`.
    pub fn try_load_from_file(path: impl AsRef<Path>) -> Result<Option<Self>, SnapshotError> {
        let path = path.as_ref();
        let started_at = Instant::now();

        if !path.try_exists().map_err(|err| SnapshotError::io(path, err))? {
            return Ok(None);
        }

        let mut conn = open_db_read_only(path).map_err(RepoError::from)?;
        let manager = SqliteSnapshotRepository::new(&mut conn).read_manager()?;

        info!(
            "event=snapshot_load module=repo status=ok users={} duration_ms={}",
            manager.users().len(),
            started_at.elapsed().as_millis()
        );
        Ok(Some(manager))
    }

    /// Writes the whole tree to `path`, replacing any previous snapshot.
    ///
    /// Missing parent directories are created. The snapshot is built in a
    /// temporary file in the target directory and renamed into place, so a
    /// failure never truncates the existing file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<SnapshotSummary, SnapshotError> {
        let path = path.as_ref();
        let started_at = Instant::now();
        info!(
            "event=snapshot_save module=repo status=start path={}",
            path.display()
        );

        match self.write_snapshot(path) {
            Ok(summary) => {
                info!(
                    "event=snapshot_save module=repo status=ok snapshot_id={} users={} albums={} photos={} tags={} duration_ms={}",
                    summary.snapshot_id,
                    summary.users,
                    summary.albums,
                    summary.photos,
                    summary.tags,
                    started_at.elapsed().as_millis()
                );
                Ok(summary)
            }
            Err(err) => {
                error!(
                    "event=snapshot_save module=repo status=error path={} duration_ms={} error_code={} error={}",
                    path.display(),
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    fn write_snapshot(&self, path: &Path) -> Result<SnapshotSummary, SnapshotError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|err| SnapshotError::io(&dir, err))?;

        // Dropping `temp_path` on any early return removes the partial file.
        let temp_path = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&dir)
            .map_err(|err| SnapshotError::io(&dir, err))?
            .into_temp_path();

        let mut conn = open_db(&temp_path).map_err(RepoError::from)?;
        let summary = SqliteSnapshotRepository::new(&mut conn).write_manager(self)?;
        conn.close().map_err(|(_, err)| RepoError::from(err))?;

        temp_path
            .persist(path)
            .map_err(|err| SnapshotError::io(path, err.error))?;
        Ok(summary)
    }
}
