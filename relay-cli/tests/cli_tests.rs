use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;

use relay_core::{database, Database, DatabaseNode, Layout, TaskName, Version};
use tempfile::TempDir;

fn relay_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("relay"));
    cmd.arg("--root").arg(root).env_remove("RUST_LOG");
    cmd
}

fn seed_database(root: &Path) {
    let mut node = DatabaseNode::default();
    node.record_delivery(Version::parse("1.1"), "Foo_1.1_Cno（bot）.7z".to_string());
    let mut db = Database::new();
    db.insert(TaskName::from("Foo"), node);
    database::save(&Layout::new(root), &db).expect("save db");
}

#[test]
fn init_creates_layout_and_keeps_existing_config() {
    let root = TempDir::new().expect("root");

    relay_cmd(root.path())
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Initialized relay root"));
    assert!(root.path().join("relay.yaml").is_file());
    assert!(root.path().join("tasks").is_dir());
    assert!(root.path().join("builds").is_dir());

    fs::write(root.path().join("relay.yaml"), "max_builds: 7\n").expect("edit config");
    relay_cmd(root.path())
        .arg("init")
        .assert()
        .success()
        .stdout(contains("already initialized"));
    let config = fs::read_to_string(root.path().join("relay.yaml")).expect("read config");
    assert_eq!(config, "max_builds: 7\n");
}

#[test]
fn tasks_lists_valid_and_invalid_definitions() {
    let root = TempDir::new().expect("root");
    relay_cmd(root.path()).args(["init", "--example"]).assert().success();

    let broken = root.path().join("tasks").join("Broken");
    fs::create_dir_all(&broken).expect("broken dir");
    fs::write(broken.join("task.yaml"), "name: Broken\n").expect("broken task");

    relay_cmd(root.path())
        .arg("tasks")
        .assert()
        .success()
        .stdout(contains("Example"))
        .stdout(contains("valid"))
        .stdout(contains("missing \"category\""))
        .stdout(contains("2 tasks, 1 invalid"));
}

#[test]
fn status_json_reports_delivered_builds() {
    let root = TempDir::new().expect("root");
    seed_database(root.path());

    let output = relay_cmd(root.path())
        .args(["status", "--json"])
        .output()
        .expect("run status");
    assert!(output.status.success());

    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON on stdout");
    assert_eq!(payload[0]["task"], "Foo");
    assert_eq!(payload[0]["latest_version"], "1.1");
    assert_eq!(payload[0]["builds"][0], "Foo_1.1_Cno（bot）.7z");
    assert_eq!(payload[0]["registered"], false);
}

#[test]
fn status_table_on_empty_root() {
    let root = TempDir::new().expect("root");
    relay_cmd(root.path())
        .arg("status")
        .assert()
        .success()
        .stdout(contains("0 tasks").and(contains("Nothing delivered yet.")));
}

#[test]
fn check_unknown_task_fails() {
    let root = TempDir::new().expect("root");
    relay_cmd(root.path()).arg("init").assert().success();
    relay_cmd(root.path())
        .args(["check", "Nope"])
        .assert()
        .failure()
        .stderr(contains("cannot load task 'Nope'"));
}

#[test]
fn run_without_download_daemon_is_batch_fatal() {
    let root = TempDir::new().expect("root");
    relay_cmd(root.path()).arg("init").assert().success();
    fs::write(root.path().join("relay.yaml"), "aria2:\n  port: 1\n").expect("config");

    relay_cmd(root.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(contains("download daemon unavailable"));
}

#[test]
fn malformed_config_is_reported() {
    let root = TempDir::new().expect("root");
    fs::write(root.path().join("relay.yaml"), "max_builds: [oops\n").expect("config");
    relay_cmd(root.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(contains("failed to load relay.yaml"));
}
