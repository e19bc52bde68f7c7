use chrono::{Local, TimeZone};
use photos_core::db::open_db_in_memory;
use photos_core::repo::snapshot_repo::{SnapshotRepository, SqliteSnapshotRepository};
use photos_core::{Photo, SnapshotError, Tag, UserManager};
use rusqlite::Connection;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

fn photo_file(dir: &Path, name: &str, modified: (i32, u32, u32)) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let (year, month, day) = modified;
    let at = Local
        .with_ymd_and_hms(year, month, day, 12, 0, 0)
        .unwrap();
    file.set_modified(SystemTime::from(at)).unwrap();
    path
}

/// alice: "Trip" [early, late], "Best of" [late]; bob: one empty album.
fn sample_manager(dir: &Path) -> (UserManager, PathBuf, PathBuf) {
    let early = photo_file(dir, "early.jpg", (2023, 1, 1));
    let late = photo_file(dir, "late.jpg", (2023, 6, 15));

    let mut manager = UserManager::new();
    manager.ensure_built_in_users();
    let alice = manager.add_user("Alice").unwrap();
    alice.create_album("Trip").unwrap();
    alice.create_album("Best of").unwrap();
    alice.add_photo_to_album("Trip", Photo::new(&early).unwrap());
    alice.add_photo_to_album("Trip", Photo::new(&late).unwrap());
    alice.add_photo_to_album("Best of", Photo::new(&late).unwrap());
    let shared = alice.photo_mut(&late).unwrap();
    shared.set_caption("Sunset");
    shared.add_tag(Tag::new("location", "Malibu").unwrap());
    shared.add_tag(Tag::new("person", "Ann").unwrap());

    manager.add_user("bob").unwrap().create_album("Empty").unwrap();
    (manager, early, late)
}

#[test]
fn save_then_load_restores_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, early, late) = sample_manager(dir.path());
    let snapshot = dir.path().join("users.dat");

    let summary = manager.save_to_file(&snapshot).unwrap();
    assert_eq!(summary.users, 4);
    assert_eq!(summary.albums, 3);
    assert_eq!(summary.photos, 2);
    assert_eq!(summary.tags, 2);

    let loaded = UserManager::load_from_file(&snapshot);
    let names: Vec<&str> = loaded.users().iter().map(|u| u.username()).collect();
    assert_eq!(names, ["admin", "stock", "Alice", "bob"]);

    let alice = loaded.user("alice").unwrap();
    let album_names: Vec<&str> = alice.albums().iter().map(|a| a.name()).collect();
    assert_eq!(album_names, ["Trip", "Best of"]);
    assert_eq!(alice.album("Trip").unwrap().photo_paths(), &[early, late.clone()]);

    let photo = alice.photo(&late).unwrap();
    assert_eq!(photo.caption(), "Sunset");
    assert_eq!(
        photo.tags(),
        &[
            Tag::new("location", "Malibu").unwrap(),
            Tag::new("person", "Ann").unwrap()
        ]
    );
    assert_eq!(photo.formatted_captured_at(), "2023-06-15 12:00:00");
    assert_eq!(
        alice.album_view("Trip").unwrap().formatted_date_range(),
        "2023-01-01 - 2023-06-15"
    );
    assert!(loaded.user("bob").unwrap().album("empty").unwrap().is_empty());
}

#[test]
fn album_filled_through_user_keeps_paths_and_order_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = UserManager::new();
    let carol = manager.add_user("carol").unwrap();
    carol.create_album("Trip").unwrap();
    for (name, date) in [
        ("c.jpg", (2023, 3, 1)),
        ("a.jpg", (2023, 1, 1)),
        ("b.jpg", (2023, 2, 1)),
    ] {
        let photo = Photo::new(photo_file(dir.path(), name, date)).unwrap();
        assert_eq!(carol.add_photo_to_album("Trip", photo), Some(true));
    }
    let before = carol.album("Trip").unwrap().photo_paths().to_vec();
    assert_eq!(carol.album_view("Trip").unwrap().photos().count(), 3);

    let snapshot = dir.path().join("users.dat");
    manager.save_to_file(&snapshot).unwrap();
    let loaded = UserManager::load_from_file(&snapshot);

    let carol = loaded.user("carol").unwrap();
    assert_eq!(carol.album("Trip").unwrap().photo_paths(), before.as_slice());
    assert_eq!(carol.photos().len(), 3);
    let view = carol.album_view("Trip").unwrap();
    assert_eq!(view.photos().count(), 3);
    assert_eq!(view.formatted_date_range(), "2023-01-01 - 2023-03-01");
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_photo_path_round_trips() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(OsStr::from_bytes(b"caf\xe9.jpg"));
    File::create(&path).unwrap();
    let mut manager = UserManager::new();
    let alice = manager.add_user("alice").unwrap();
    alice.create_album("Trip").unwrap();
    alice.add_photo_to_album("Trip", Photo::new(&path).unwrap());
    alice.photo_mut(&path).unwrap().set_caption("Cafe");

    let snapshot = dir.path().join("users.dat");
    manager.save_to_file(&snapshot).unwrap();
    let loaded = UserManager::try_load_from_file(&snapshot).unwrap().unwrap();

    let alice = loaded.user("alice").unwrap();
    assert_eq!(alice.photo(&path).unwrap().caption(), "Cafe");
    assert!(alice.album("Trip").unwrap().contains_path(&path));
    assert!(serde_json::to_string(&loaded).unwrap().contains("caf\u{fffd}.jpg"));
}

#[test]
fn shared_photo_stays_single_instance_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, _, late) = sample_manager(dir.path());
    let snapshot = dir.path().join("users.dat");
    manager.save_to_file(&snapshot).unwrap();

    let mut loaded = UserManager::load_from_file(&snapshot);
    let alice = loaded.user_mut("Alice").unwrap();
    assert_eq!(alice.photos().len(), 2);

    alice.photo_mut(&late).unwrap().set_caption("Edited once");
    let alice: &photos_core::User = alice;
    let captions: Vec<&str> = ["Trip", "Best of"]
        .iter()
        .map(|album| {
            let view = alice.album_view(album).unwrap();
            view.photos()
                .find(|photo| photo.path() == late)
                .unwrap()
                .caption()
        })
        .collect();
    assert_eq!(captions, ["Edited once", "Edited once"]);
}

#[test]
fn save_load_cycle_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, _, _) = sample_manager(dir.path());
    let first_path = dir.path().join("first.dat");
    let second_path = dir.path().join("second.dat");

    manager.save_to_file(&first_path).unwrap();
    let first = UserManager::load_from_file(&first_path);
    first.save_to_file(&second_path).unwrap();
    let second = UserManager::load_from_file(&second_path);

    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[test]
fn missing_snapshot_loads_empty_manager() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("absent.dat");

    assert!(UserManager::try_load_from_file(&snapshot).unwrap().is_none());
    assert!(UserManager::load_from_file(&snapshot).users().is_empty());
    assert!(!snapshot.exists());
}

#[test]
fn corrupt_snapshot_loads_empty_manager() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("users.dat");
    std::fs::write(&snapshot, vec![0x5a_u8; 4096]).unwrap();

    let err = UserManager::try_load_from_file(&snapshot).unwrap_err();
    assert_eq!(err.code(), "snapshot_db_failed");
    assert!(UserManager::load_from_file(&snapshot).users().is_empty());
}

#[test]
fn snapshot_with_foreign_format_marker_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("users.dat");
    UserManager::new().save_to_file(&snapshot).unwrap();

    let conn = Connection::open(&snapshot).unwrap();
    conn.execute(
        "UPDATE snapshot_meta SET value = 'other' WHERE key = 'format';",
        [],
    )
    .unwrap();
    drop(conn);

    let err = UserManager::try_load_from_file(&snapshot).unwrap_err();
    assert_eq!(err.code(), "snapshot_invalid_data");
}

#[test]
fn save_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("nested").join("data").join("users.dat");
    let mut manager = UserManager::new();
    manager.add_user("alice").unwrap();

    manager.save_to_file(&snapshot).unwrap();

    assert!(snapshot.is_file());
    assert!(UserManager::load_from_file(&snapshot).user("alice").is_some());
}

#[test]
fn save_replaces_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("users.dat");
    let mut manager = UserManager::new();
    manager.add_user("alice").unwrap();
    manager.save_to_file(&snapshot).unwrap();

    manager.delete_user("alice");
    manager.add_user("bob").unwrap();
    manager.save_to_file(&snapshot).unwrap();

    let loaded = UserManager::load_from_file(&snapshot);
    assert!(loaded.user("alice").is_none());
    assert!(loaded.user("bob").is_some());
}

#[test]
fn failed_save_leaves_no_partial_files() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("occupied");
    std::fs::create_dir(&target).unwrap();
    std::fs::write(target.join("keep.txt"), b"keep").unwrap();
    let mut manager = UserManager::new();
    manager.add_user("alice").unwrap();

    let err = manager.save_to_file(&target).unwrap_err();
    assert!(matches!(err, SnapshotError::Io { .. }), "got {err}");
    assert_eq!(err.code(), "snapshot_io_failed");

    assert!(target.join("keep.txt").is_file());
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .filter(|name| name != "occupied")
        .collect();
    assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
}

#[test]
fn repository_round_trips_through_in_memory_connection() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, _, _) = sample_manager(dir.path());
    let mut conn = open_db_in_memory().unwrap();

    let mut repo = SqliteSnapshotRepository::new(&mut conn);
    let first = repo.write_manager(&manager).unwrap();
    let second = repo.write_manager(&manager).unwrap();
    let loaded = repo.read_manager().unwrap();

    assert_ne!(first.snapshot_id, second.snapshot_id);
    assert_eq!(second.photos, 2);
    assert_eq!(loaded.users().len(), manager.users().len());
}
