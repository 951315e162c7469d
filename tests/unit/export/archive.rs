use super::*;

#[test]
fn zip_keeps_entry_order_and_contents() {
    let entries = vec![
        ArchiveEntry::new("player.bundle.js", "run()"),
        ArchiveEntry::new("scene.js", "window.x = {};"),
        ArchiveEntry::new("assets/logo.svg", b"<svg/>".to_vec()),
    ];
    let bytes = write_zip(&entries).unwrap();
    assert_eq!(
        zip_entry_names(&bytes).unwrap(),
        vec!["player.bundle.js", "scene.js", "assets/logo.svg"]
    );
    assert_eq!(read_zip_entry(&bytes, "scene.js").unwrap(), b"window.x = {};");
}

#[test]
fn empty_archive_is_valid() {
    let bytes = write_zip(&[]).unwrap();
    assert!(zip_entry_names(&bytes).unwrap().is_empty());
}

#[test]
fn reading_garbage_or_missing_entry_fails() {
    assert!(matches!(
        zip_entry_names(b"not a zip"),
        Err(EncodeError::Archive(_))
    ));
    let bytes = write_zip(&[ArchiveEntry::new("a", "1")]).unwrap();
    assert!(read_zip_entry(&bytes, "b").is_err());
}
