//! Connection bootstrap utilities for snapshot databases.
//!
//! # Responsibility
//! - Open writable (file or in-memory) connections with migrations applied.
//! - Open existing snapshots read-only after a schema version check.
//!
//! # Invariants
//! - Writable connections have `foreign_keys=ON` and the latest schema.
//! - Read-only connections never modify the snapshot file.

use super::migrations::{apply_migrations, ensure_current_schema};
use super::DbResult;
use log::{debug, error};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens (creating if needed) a SQLite file and applies pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let started_at = Instant::now();
    debug!("event=db_open module=db status=start mode=file");

    let mut conn = match Connection::open(path) {
        Ok(conn) => conn,
        Err(err) => {
            log_open_failure("file", "db_open_failed", started_at, &err);
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            debug!(
                "event=db_open module=db status=ok mode=file duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            log_open_failure("file", "db_bootstrap_failed", started_at, &err);
            Err(err)
        }
    }
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    let mut conn = match Connection::open_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            log_open_failure("memory", "db_open_failed", started_at, &err);
            return Err(err.into());
        }
    };

    if let Err(err) = bootstrap_connection(&mut conn) {
        log_open_failure("memory", "db_bootstrap_failed", started_at, &err);
        return Err(err);
    }
    Ok(conn)
}

/// Opens an existing snapshot read-only and verifies its schema version.
///
/// # Errors
/// - `Sqlite` when the file is missing or not a SQLite database.
/// - `MissingSchema` / `UnsupportedSchemaVersion` on version mismatch.
pub fn open_db_read_only(path: impl AsRef<Path>) -> DbResult<Connection> {
    let started_at = Instant::now();
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = match Connection::open_with_flags(path, flags) {
        Ok(conn) => conn,
        Err(err) => {
            log_open_failure("read_only", "db_open_failed", started_at, &err);
            return Err(err.into());
        }
    };

    if let Err(err) = ensure_current_schema(&conn) {
        log_open_failure("read_only", "db_schema_mismatch", started_at, &err);
        return Err(err);
    }

    debug!(
        "event=db_open module=db status=ok mode=read_only duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    Ok(())
}

fn log_open_failure(
    mode: &str,
    error_code: &str,
    started_at: Instant,
    err: &dyn std::fmt::Display,
) {
    error!(
        "event=db_open module=db status=error mode={} duration_ms={} error_code={} error={}",
        mode,
        started_at.elapsed().as_millis(),
        error_code,
        err
    );
}
