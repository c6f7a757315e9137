//! Tests for manifest building from files and directories.

use fbi_core::{ACCEPTED_EXTENSIONS, ManifestError, build_manifest};
use percent_encoding::percent_decode_str;
use std::fs;

const HOST: &str = "192.168.1.10";
const PORT: u16 = 8080;

fn decoded_name(url: &str) -> String {
    let (_, segment) = url.rsplit_once('/').unwrap();
    percent_decode_str(segment).decode_utf8().unwrap().into_owned()
}

#[test]
fn test_directory_keeps_only_eligible_files() {
    let dir = tempfile::tempdir().unwrap();
    for name in [
        "b game.cia",
        "A.TIK",
        "title.cetk",
        "app.3dsx",
        "notes.txt",
        "cover.png",
        "noext",
    ] {
        fs::write(dir.path().join(name), b"data").unwrap();
    }
    // Directories are skipped even with an accepted extension
    fs::create_dir(dir.path().join("folder.cia")).unwrap();
    fs::write(dir.path().join("folder.cia").join("inner.cia"), b"data").unwrap();

    let (manifest, serving_dir) = build_manifest(dir.path(), HOST, PORT).unwrap();

    assert_eq!(serving_dir, dir.path());
    assert_eq!(manifest.len(), 4);
    let mut names: Vec<String> = manifest.urls().iter().map(|u| decoded_name(u)).collect();
    names.sort();
    assert_eq!(names, vec!["A.TIK", "app.3dsx", "b game.cia", "title.cetk"]);

    for url in manifest.urls() {
        assert!(url.starts_with("192.168.1.10:8080/"), "{}", url);
        assert!(!url.contains(' '));
    }
}

#[test]
fn test_directory_order_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["c.cia", "a.cia", "b.cia"] {
        fs::write(dir.path().join(name), b"data").unwrap();
    }

    let (first, _) = build_manifest(dir.path(), HOST, PORT).unwrap();
    let (second, _) = build_manifest(dir.path(), HOST, PORT).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first.payload(),
        "192.168.1.10:8080/a.cia\n192.168.1.10:8080/b.cia\n192.168.1.10:8080/c.cia"
    );
}

#[test]
fn test_special_characters_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let names = [
        "Pokémon Y (EUR).cia",
        "100% #1?.cia",
        "ゲーム.3dsx",
        "a+b&c=d;e.tik",
    ];
    for name in names {
        fs::write(dir.path().join(name), b"data").unwrap();
    }

    let (manifest, _) = build_manifest(dir.path(), HOST, PORT).unwrap();
    assert_eq!(manifest.len(), names.len());

    let mut decoded: Vec<String> = manifest.urls().iter().map(|u| decoded_name(u)).collect();
    decoded.sort();
    let mut expected: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    expected.sort();
    assert_eq!(decoded, expected);

    for url in manifest.urls() {
        let (_, segment) = url.split_once('/').unwrap();
        assert!(segment.is_ascii(), "{}", url);
        assert!(!segment.contains(['#', '?', ' ']), "{}", url);
    }
}

#[test]
fn test_single_file_served_from_parent() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Game.CIA");
    fs::write(&file, b"data").unwrap();
    fs::write(dir.path().join("other.cia"), b"data").unwrap();

    let (manifest, serving_dir) = build_manifest(&file, HOST, PORT).unwrap();

    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest.urls()[0], "192.168.1.10:8080/Game.CIA");
    assert_eq!(manifest.payload(), "192.168.1.10:8080/Game.CIA");
    assert_eq!(serving_dir, dir.path());
}

#[test]
fn test_single_file_with_rejected_extension() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("readme.txt");
    fs::write(&file, b"data").unwrap();

    let err = build_manifest(&file, HOST, PORT).unwrap_err();
    match &err {
        ManifestError::UnsupportedExtension { accepted, .. } => {
            assert_eq!(accepted.as_slice(), ACCEPTED_EXTENSIONS.as_slice());
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let message = err.to_string();
    for ext in ACCEPTED_EXTENSIONS {
        assert!(message.contains(ext), "{} missing from {}", ext, message);
    }
}

#[test]
fn test_directory_without_eligible_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("readme.txt"), b"data").unwrap();

    let err = build_manifest(dir.path(), HOST, PORT).unwrap_err();
    assert!(matches!(err, ManifestError::NoEligibleFiles { .. }));

    let empty = tempfile::tempdir().unwrap();
    let err = build_manifest(empty.path(), HOST, PORT).unwrap_err();
    assert!(matches!(err, ManifestError::NoEligibleFiles { .. }));
}

#[test]
fn test_missing_path_has_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let err = build_manifest(&dir.path().join("gone"), HOST, PORT).unwrap_err();
    assert!(matches!(err, ManifestError::NoEligibleFiles { .. }));
}

#[test]
fn test_build_does_not_touch_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.cia"), b"data").unwrap();
    let before: Vec<_> = fs::read_dir(dir.path()).unwrap().flatten().map(|e| e.path()).collect();

    build_manifest(dir.path(), HOST, PORT).unwrap();

    let after: Vec<_> = fs::read_dir(dir.path()).unwrap().flatten().map(|e| e.path()).collect();
    assert_eq!(before, after);
    assert_eq!(fs::read(dir.path().join("a.cia")).unwrap(), b"data");
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_names_are_skipped() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(OsStr::from_bytes(b"g\xffame.cia")), b"data").unwrap();

    let err = build_manifest(dir.path(), HOST, PORT).unwrap_err();
    assert!(matches!(err, ManifestError::NoEligibleFiles { .. }));

    fs::write(dir.path().join("game.cia"), b"data").unwrap();
    let (manifest, _) = build_manifest(dir.path(), HOST, PORT).unwrap();
    assert_eq!(manifest.urls(), [format!("{}:{}/game.cia", HOST, PORT)]);
}
