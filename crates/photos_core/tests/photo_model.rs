use chrono::{Local, TimeZone};
use photos_core::{ModelError, Photo, Tag};
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

#[test]
fn photo_new_reads_capture_time_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = photo_file(dir.path(), "beach.jpg", (2023, 6, 15));

    let photo = Photo::new(&path).unwrap();

    assert_eq!(photo.path(), path.as_path());
    assert_eq!(photo.caption(), "");
    assert!(photo.tags().is_empty());
    assert_eq!(photo.formatted_captured_at(), "2023-06-15 12:00:00");
}

#[test]
fn photo_new_rejects_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.jpg");

    let err = Photo::new(&missing).unwrap_err();
    match err {
        ModelError::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn photo_new_rejects_blank_path() {
    let err = Photo::new("  ").unwrap_err();
    assert!(matches!(err, ModelError::InvalidArgument { .. }));
}

#[test]
fn photos_with_same_path_are_equal_despite_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = photo_file(dir.path(), "beach.jpg", (2023, 1, 1));
    std::fs::create_dir(dir.path().join("trip")).unwrap();

    let mut direct = Photo::new(&path).unwrap();
    let detour = Photo::new(dir.path().join("trip").join("..").join("beach.jpg")).unwrap();
    direct.set_caption("Sunset");
    direct.add_tag(Tag::new("location", "Malibu").unwrap());

    assert_eq!(direct.path(), detour.path());
    assert_eq!(direct, detour);
}

#[test]
fn photo_caption_is_trimmed() {
    let dir = tempfile::tempdir().unwrap();
    let mut photo = Photo::new(photo_file(dir.path(), "a.jpg", (2023, 1, 1))).unwrap();

    photo.set_caption("  Sunset at the pier  ");
    assert_eq!(photo.caption(), "Sunset at the pier");

    photo.set_caption("   ");
    assert_eq!(photo.caption(), "");
}

#[test]
fn photo_tags_reject_case_insensitive_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let mut photo = Photo::new(photo_file(dir.path(), "a.jpg", (2023, 1, 1))).unwrap();

    assert!(photo.add_tag(Tag::new("location", "NYC").unwrap()));
    assert!(!photo.add_tag(Tag::new("Location", "nyc").unwrap()));
    assert!(photo.add_tag(Tag::new("person", "Ann").unwrap()));
    assert_eq!(photo.tags().len(), 2);

    assert!(photo.remove_tag(&Tag::new("LOCATION", "NYC").unwrap()));
    assert!(!photo.remove_tag(&Tag::new("location", "NYC").unwrap()));
    assert_eq!(photo.tags(), &[Tag::new("person", "Ann").unwrap()]);
}

#[test]
fn refresh_captured_at_follows_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = photo_file(dir.path(), "a.jpg", (2023, 1, 1));
    let mut photo = Photo::new(&path).unwrap();

    let later = Local.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::from(later))
        .unwrap();
    photo.refresh_captured_at().unwrap();

    assert_eq!(photo.formatted_captured_at(), "2024-02-29 12:00:00");
}
