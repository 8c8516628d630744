//! Tests for the `memcheck` binary.

use assert_cmd::Command;
use memcheck::core::{CSV_FILE_NAME, JSON_FILE_NAME, PROJECT_ROOT_ENV};
use std::fs;
use std::path::PathBuf;
use std::process::Output;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/filetest").join(name)
}

fn memcheck(args: &[&str], root: Option<&str>, dir: &TempDir) -> Output {
    let mut command = Command::cargo_bin("memcheck").expect("binary not found");
    command.args(args).arg("--output-dir").arg(dir.path());
    match root {
        Some(root) => command.env(PROJECT_ROOT_ENV, root),
        None => command.env_remove(PROJECT_ROOT_ENV),
    };
    command.output().expect("failed to launch memcheck")
}

#[test]
fn test_root_from_environment() {
    let dir = TempDir::new().unwrap();
    let input = fixture("add.tir");
    let output = memcheck(&[input.to_str().unwrap()], Some("/proj"), &dir);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(" Function Name (Mangled): add\n"));

    let csv = fs::read_to_string(dir.path().join(CSV_FILE_NAME)).unwrap();
    assert!(csv.ends_with("add,add,2,1,12\n"));
    assert!(dir.path().join(JSON_FILE_NAME).exists());
}

#[test]
fn test_flag_overrides_environment() {
    let dir = TempDir::new().unwrap();
    let input = fixture("add.tir");
    let output = memcheck(&[input.to_str().unwrap(), "--project-root", "/elsewhere"], Some("/proj"), &dir);

    assert!(output.status.success());
    let csv = fs::read_to_string(dir.path().join(CSV_FILE_NAME)).unwrap();
    assert_eq!(csv.lines().count(), 1);
}

#[test]
fn test_missing_root_still_succeeds() {
    let dir = TempDir::new().unwrap();
    let input = fixture("add.tir");
    let output = memcheck(&[input.to_str().unwrap()], None, &dir);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: $SCOP_ROOT environment variable is not set."));
    assert_eq!(fs::read_to_string(dir.path().join(JSON_FILE_NAME)).unwrap(), "[\n\n]");
}

#[test]
fn test_print_ir() {
    let dir = TempDir::new().unwrap();
    let input = fixture("calls.tir");
    let output = memcheck(&[input.to_str().unwrap(), "--print-ir"], Some("/proj"), &dir);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Printing IR\n"));
    assert!(stdout.contains("Extern function h"));
}

#[test]
fn test_unreadable_input_fails() {
    let dir = TempDir::new().unwrap();
    let output = memcheck(&["/definitely/not/here.tir"], Some("/proj"), &dir);
    assert!(!output.status.success());
}
