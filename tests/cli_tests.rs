//! Integration tests for the zippick binary.
//!
//! Note: Tests use `unwrap`/`expect` which is acceptable in test code.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zippick::test_utils::{ZipBuilder, crc32};

fn zippick_cmd() -> Command {
    cargo_bin_cmd!("zippick")
}

/// Writes the three-entry archive used by most tests and returns its path.
fn sample_archive(dir: &Path) -> PathBuf {
    let data = ZipBuilder::new()
        .stored("A.txt", b"alpha")
        .stored("B.txt", b"bravo")
        .deflated("AB.txt", &b"alpha bravo ".repeat(40))
        .finish();
    let path = dir.join("sample.zip");
    std::fs::write(&path, data).expect("failed to write archive");
    path
}

#[test]
fn test_version_flag() {
    zippick_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("zippick"));
}

#[test]
fn test_help_flag() {
    zippick_cmd()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--list"));
}

#[test]
fn test_missing_archive_argument() {
    zippick_cmd().assert().code(1);
}

#[test]
fn test_unknown_option() {
    zippick_cmd().arg("--bogus").arg("x.zip").assert().code(1);
}

#[test]
fn test_conflicting_modes() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = sample_archive(temp.path());

    zippick_cmd()
        .arg("-l")
        .arg("-t")
        .arg(&archive)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("only one mode selection allowed"));
}

#[test]
fn test_nonexistent_archive() {
    let temp = TempDir::new().expect("failed to create temp dir");

    zippick_cmd()
        .arg("-l")
        .arg(temp.path().join("missing.zip"))
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("zippick: "));
}

#[test]
fn test_not_a_zip_file() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let path = temp.path().join("plain.zip");
    std::fs::write(&path, "definitely not an archive").unwrap();

    zippick_cmd()
        .arg("-l")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot open zip archive"));
}

#[test]
fn test_list_whole_archive() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = sample_archive(temp.path());

    zippick_cmd()
        .arg("-l")
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("  A.txt\n"))
        .stdout(predicate::str::contains("  B.txt\n"))
        .stdout(predicate::str::contains("  AB.txt\n"))
        .stdout(predicate::str::contains("3 files"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_list_literal_and_glob() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = sample_archive(temp.path());

    zippick_cmd()
        .arg("--list")
        .arg(&archive)
        .arg("A.txt")
        .arg("*.txt")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 files"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_list_reports_unmatched_names() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = sample_archive(temp.path());

    zippick_cmd()
        .arg("-l")
        .arg(&archive)
        .arg("C.txt")
        .arg("B*")
        .assert()
        .success()
        .stdout(predicate::str::contains("  B.txt\n"))
        .stdout(predicate::str::contains("  A.txt").not())
        .stdout(predicate::str::contains("1 file\n"))
        .stderr(predicate::str::contains("C.txt: no such entry in archive"))
        .stderr(predicate::str::contains("B*").not());
}

#[test]
fn test_test_mode_success() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = sample_archive(temp.path());

    zippick_cmd()
        .arg("-t")
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("testing: AB.txt   OK"))
        .stdout(predicate::str::contains("No errors detected"));
}

#[test]
fn test_test_mode_detects_corruption() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let path = temp.path().join("bad.zip");
    let data = ZipBuilder::new()
        .stored("ok.txt", b"fine")
        .stored_with_crc("bad.txt", b"broken", crc32(b"intact"))
        .finish();
    std::fs::write(&path, data).unwrap();

    zippick_cmd()
        .arg("--test")
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("testing: bad.txt   bad CRC"));

    // Selecting only the intact entry passes
    zippick_cmd()
        .arg("--test")
        .arg(&path)
        .arg("ok.txt")
        .assert()
        .success();
}

#[test]
fn test_extract_selected_entries() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = sample_archive(temp.path());
    let out = temp.path().join("out");

    zippick_cmd()
        .arg("-d")
        .arg(&out)
        .arg(&archive)
        .arg("A*")
        .assert()
        .success()
        .stdout(predicate::str::contains("extracting: A.txt"))
        .stdout(predicate::str::contains("extracting: AB.txt"));

    assert_eq!(std::fs::read(out.join("A.txt")).unwrap(), b"alpha");
    assert_eq!(
        std::fs::read(out.join("AB.txt")).unwrap(),
        b"alpha bravo ".repeat(40)
    );
    assert!(!out.join("B.txt").exists());
}

#[test]
fn test_extract_nothing_matched_still_succeeds() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let archive = sample_archive(temp.path());
    let out = temp.path().join("out");

    zippick_cmd()
        .arg("-q")
        .arg("-d")
        .arg(&out)
        .arg(&archive)
        .arg("*.md")
        .assert()
        .success()
        .stderr(predicate::str::contains("*.md: no such entry in archive"));

    assert!(!out.exists());
}

#[cfg(unix)]
#[test]
fn test_undecodable_names_select_and_extract() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp = TempDir::new().expect("failed to create temp dir");
    let path = temp.path().join("raw.zip");
    let data = ZipBuilder::new()
        .stored(b"a\xff", b"first")
        .stored(b"a\xfe", b"second")
        .finish();
    std::fs::write(&path, data).unwrap();

    zippick_cmd()
        .arg("-l")
        .arg(&path)
        .arg(OsStr::from_bytes(b"a\xfe"))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 file\n"))
        .stderr(predicate::str::is_empty());

    let out = temp.path().join("out");
    zippick_cmd()
        .arg("-q")
        .arg("-d")
        .arg(&out)
        .arg(&path)
        .arg("a?")
        .assert()
        .success();

    assert_eq!(std::fs::read(out.join(OsStr::from_bytes(b"a\xff"))).unwrap(), b"first");
    assert_eq!(std::fs::read(out.join(OsStr::from_bytes(b"a\xfe"))).unwrap(), b"second");
}
