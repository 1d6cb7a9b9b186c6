//! CLI tests
//!
//! Runs the `recents` binary against a config file in a temp directory so
//! the user's real configuration is never read.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use recents_loader::Config;

fn recents() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_recents"));
    cmd.env("NO_COLOR", "1");
    cmd
}

fn default_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("config.toml");
    Config::default().save_to(&path).unwrap();
    path
}

fn with_config(path: &Path) -> Command {
    let mut cmd = recents();
    cmd.arg("--config").arg(path);
    cmd
}

#[test]
fn help_lists_commands() {
    recents()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("budget"))
        .stdout(predicate::str::contains("simulate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn budget_shows_sizes_and_pressure_targets() {
    let dir = TempDir::new().unwrap();
    let path = default_config(&dir);
    with_config(&path)
        .arg("budget")
        .assert()
        .success()
        .stdout(predicate::str::contains("Thumbnails:"))
        .stdout(predicate::str::contains("MiB"))
        .stdout(predicate::str::contains("moderate"))
        .stdout(predicate::str::contains("evict everything"));
}

#[test]
fn budget_reports_disabled_cache() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[cache]\ndisable_background_cache = true\n").unwrap();
    with_config(&path)
        .arg("budget")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 B"))
        .stdout(predicate::str::contains("background cache disabled"));
}

#[test]
fn config_show_prints_toml() {
    let dir = TempDir::new().unwrap();
    let path = default_config(&dir);
    with_config(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[cache]"))
        .stdout(predicate::str::contains("max_memory_mb = 256"))
        .stdout(predicate::str::contains("preload_count = 10"));
}

#[test]
fn config_path_echoes_override() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    with_config(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn config_init_refuses_to_overwrite_without_force() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sub").join("config.toml");

    with_config(&path).args(["config", "init"]).assert().success();
    assert!(path.exists());

    with_config(&path)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    with_config(&path)
        .args(["config", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[loader]\nrecent_task_limit = 0\n").unwrap();
    with_config(&path)
        .arg("budget")
        .assert()
        .failure()
        .stderr(predicate::str::contains("recent_task_limit"));
}

#[test]
fn simulate_loads_and_reports() {
    let dir = TempDir::new().unwrap();
    let path = default_config(&dir);
    with_config(&path)
        .args(["simulate", "--tasks", "6", "--preload", "6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reloaded 6 tasks (preload 6), 5 completions"))
        .stdout(predicate::str::contains("Fetches:    6 icons, 6 thumbnails"))
        .stdout(predicate::str::contains("loaded synchronously"));
}

#[test]
fn simulate_applies_pressure_in_order() {
    let dir = TempDir::new().unwrap();
    let path = default_config(&dir);
    with_config(&path)
        .args([
            "simulate",
            "--tasks",
            "4",
            "--pressure",
            "low",
            "--pressure",
            "critical",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("After low pressure:"))
        .stdout(predicate::str::contains("After critical pressure:"));
}

#[test]
fn simulate_rejects_unknown_pressure() {
    let dir = TempDir::new().unwrap();
    let path = default_config(&dir);
    with_config(&path)
        .args(["simulate", "--pressure", "severe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown memory pressure"));
}
