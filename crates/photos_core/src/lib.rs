//! Core data model and persistence for the photo library.
//! Users own albums, albums reference shared photos, and the whole tree is
//! stored as one snapshot file.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::AppConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::album::{Album, AlbumView};
pub use model::error::{ModelError, ModelResult};
pub use model::photo::Photo;
pub use model::photo_store::PhotoStore;
pub use model::tag::Tag;
pub use model::user::User;
pub use model::user_manager::{UserManager, ADMIN_USERNAME, STOCK_USERNAME};
pub use repo::snapshot_file::SnapshotError;
pub use repo::snapshot_repo::{RepoError, RepoResult, SnapshotSummary};
pub use service::library_service::{LibraryService, LibraryServiceError, Session};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
