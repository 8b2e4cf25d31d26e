use std::fs::{self, File};
use std::path::{Path, PathBuf};

use ftml_core::Topic;
use ftml_engine::{build_archive, verify_archive, ArchiveError, ASSET_FOLDER};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use zip::ZipArchive;

fn entry_names(archive: &Path) -> Vec<String> {
    let zip = ZipArchive::new(File::open(archive).unwrap()).unwrap();
    zip.file_names().map(str::to_string).collect()
}

fn setup(dir: &Path) -> PathBuf {
    let map = dir.join("B1.ftmap");
    fs::write(&map, "<ft:map/>").unwrap();
    fs::create_dir(dir.join(ASSET_FOLDER)).unwrap();
    fs::write(dir.join(ASSET_FOLDER).join("b.png"), b"png-b").unwrap();
    fs::write(dir.join(ASSET_FOLDER).join("a.svg"), b"<svg/>").unwrap();
    map
}

fn tree() -> Vec<Topic> {
    vec![Topic::new("Parent", "parent.html")
        .with_content("<html>parent</html>")
        .with_sub_topics(vec![
            Topic::new("Child", "child.html").with_content("<html>child</html>")
        ])]
}

#[test]
fn archive_holds_map_topics_and_assets_in_order() {
    let temp = TempDir::new().unwrap();
    let map = setup(temp.path());

    let archive = build_archive(temp.path(), &map, &tree(), ASSET_FOLDER).unwrap();
    assert_eq!(archive, temp.path().join("B1.zip"));
    assert_eq!(
        entry_names(&archive),
        vec!["B1.ftmap", "parent.html", "child.html", "image/a.svg", "image/b.png"]
    );

    let mut zip = ZipArchive::new(File::open(&archive).unwrap()).unwrap();
    let child = std::io::read_to_string(zip.by_name("child.html").unwrap()).unwrap();
    assert_eq!(child, "<html>child</html>");

    let expected = vec![PathBuf::from("parent.html"), PathBuf::from("child.html")];
    verify_archive(&archive, &expected).unwrap();
}

#[test]
fn missing_asset_folder_is_not_an_error() {
    let temp = TempDir::new().unwrap();
    let map = temp.path().join("B1.ftmap");
    fs::write(&map, "<ft:map/>").unwrap();

    let archive = build_archive(temp.path(), &map, &tree(), "figures").unwrap();
    assert_eq!(entry_names(&archive), vec!["B1.ftmap", "parent.html", "child.html"]);
}

#[test]
fn duplicate_entry_aborts_without_leaving_an_archive() {
    let temp = TempDir::new().unwrap();
    let map = setup(temp.path());
    let topics = vec![
        Topic::new("One", "same.html"),
        Topic::new("Two", "same.html"),
    ];

    let err = build_archive(temp.path(), &map, &topics, ASSET_FOLDER).unwrap_err();
    assert!(matches!(err, ArchiveError::DuplicateEntry(ref name) if name == "same.html"));
    assert!(!temp.path().join("B1.zip").exists());
}

#[test]
fn topic_escaping_the_export_is_rejected() {
    let temp = TempDir::new().unwrap();
    let map = setup(temp.path());
    let topics = vec![Topic::new("Outside", "../outside.html")];

    let err = build_archive(temp.path(), &map, &topics, ASSET_FOLDER).unwrap_err();
    assert!(matches!(err, ArchiveError::InvalidPath(_)));
}

#[test]
fn verification_names_the_missing_file() {
    let temp = TempDir::new().unwrap();
    let map = setup(temp.path());
    let archive = build_archive(temp.path(), &map, &tree(), ASSET_FOLDER).unwrap();

    let expected = vec![PathBuf::from("parent.html"), PathBuf::from("ghost.html")];
    let err = verify_archive(&archive, &expected).unwrap_err();
    assert!(matches!(err, ArchiveError::MissingEntry(ref name) if name == "ghost.html"));
}
