//! Tests for the `zk` binary
//!
//! Every test runs against a fresh vault in a temp dir with an empty config
//! home, so no user configuration leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, path: &str, content: &[u8]) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn zk(vault: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("zk").unwrap();
    cmd.env("XDG_CONFIG_HOME", vault.path().join(".config"))
        .env_remove("ZETTEL_VAULT")
        .env_remove("RUST_LOG")
        .arg("--vault")
        .arg(vault.path());
    cmd
}

#[test]
fn test_prefix_extracts_from_name() {
    let vault = TempDir::new().unwrap();
    zk(&vault)
        .args(["prefix", "200101-120000 note.md"])
        .assert()
        .success()
        .stdout("200101-120000\n");
}

#[test]
fn test_prefix_rejects_unprefixed_name() {
    let vault = TempDir::new().unwrap();
    zk(&vault)
        .args(["prefix", "My Note.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not start with a zk prefix"));
}

#[test]
fn test_fresh_prefix_has_the_right_shape() {
    let vault = TempDir::new().unwrap();
    zk(&vault)
        .arg("prefix")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^[0-9]{6}-[0-9]{6}\n$").unwrap());
}

#[test]
fn test_hash_prints_md5_by_default() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "hello.txt", b"hello world");

    zk(&vault)
        .arg("hash")
        .arg(vault.path().join("hello.txt"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("5eb63bbbe01eeed093cb22bb8f5acdc3"));
}

#[test]
fn test_rename_prefixes_note_and_writes_id() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "My Note.md", b"body\n");

    zk(&vault)
        .args(["--format", "json", "rename", "My Note.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"renamed\""));

    assert!(!vault.path().join("My Note.md").exists());
    let renamed: Vec<_> = fs::read_dir(vault.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(" My Note.md"))
        .collect();
    assert_eq!(renamed.len(), 1);

    let text = fs::read_to_string(vault.path().join(&renamed[0])).unwrap();
    let prefix = &renamed[0][..13];
    assert_eq!(text, format!("---\nID: {prefix}\n---\nbody\n"));
}

#[test]
fn test_sync_reports_unchanged() {
    let vault = TempDir::new().unwrap();
    write(
        vault.path(),
        "200101-120000 n.md",
        b"---\nID: \"200101-120000\"\n---\n",
    );

    zk(&vault)
        .args(["sync", "200101-120000 n.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged"));
}

#[test]
fn test_assets_moves_embeds() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "200101-120000 n.md", b"![[pic.png]]\n");
    write(vault.path(), "pic.png", b"hello world");

    zk(&vault)
        .args(["assets", "200101-120000 n.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 moved"));

    assert!(vault
        .path()
        .join("assets/200101-120000/5eb63bbbe01eeed093cb22bb8f5acdc3.png")
        .is_file());
    assert_eq!(
        fs::read_to_string(vault.path().join("200101-120000 n.md")).unwrap(),
        "![[5eb63bbbe01eeed093cb22bb8f5acdc3.png]]\n"
    );
}

#[test]
fn test_assets_fail_without_prefix() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "My Note.md", b"![[pic.png]]\n");
    write(vault.path(), "pic.png", b"png");

    zk(&vault)
        .args(["run", "update-assets-by-hash", "My Note.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("zk naming convention"));
    assert!(vault.path().join("pic.png").is_file());
}

#[test]
fn test_check_exit_codes() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "My Note.md", b"");

    zk(&vault)
        .args(["check", "update-filename-by-zk", "My Note.md"])
        .assert()
        .success();
    zk(&vault)
        .args(["check", "sync-frontmatter-id", "My Note.md"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("no zk prefix"));
    zk(&vault)
        .args(["check", "update-filename-by-zk"])
        .assert()
        .code(1);
}

#[test]
fn test_commands_lists_ids() {
    let vault = TempDir::new().unwrap();
    zk(&vault)
        .arg("commands")
        .assert()
        .success()
        .stdout(predicate::str::contains("update-filename-by-zk"))
        .stdout(predicate::str::contains("update-assets-in-md-by-md5"))
        .stdout(predicate::str::contains("sync-frontmatter-id"));
}

#[test]
fn test_note_path_relative_to_working_directory() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "sub/200101-120000 n.md", b"---\nID: 200101-120000\n---\n");

    zk(&vault)
        .current_dir(vault.path().join("sub"))
        .args(["sync", "200101-120000 n.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sub/200101-120000 n.md"));
}
