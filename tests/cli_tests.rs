//! Integration tests for the CLI interface
//!
//! Every test points the state directory and clones root at a temporary
//! directory through the `OCDC_*` environment overrides.

use assert_cmd::Command;
use predicates::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;

struct Env {
    home: TempDir,
}

impl Env {
    fn new() -> Self {
        let home = TempDir::new().unwrap();
        std::fs::create_dir_all(home.path().join("clones")).unwrap();
        Self { home }
    }

    fn state_dir(&self) -> PathBuf {
        self.home.path().join("state")
    }

    fn clones(&self) -> PathBuf {
        self.home.path().join("clones")
    }

    fn workspace(&self, relative: &str) -> PathBuf {
        let path = self.clones().join(relative);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::canonicalize(path).unwrap()
    }

    fn ocdc(&self) -> Command {
        let mut cmd = Command::cargo_bin("ocdc").unwrap();
        cmd.env("HOME", self.home.path())
            .env("OCDC_CACHE_DIR", self.state_dir())
            .env("OCDC_CLONES_DIR", self.clones())
            .env("OCDC_PORT_START", "19400")
            .env("OCDC_PORT_END", "19420")
            .env_remove("RUST_LOG");
        cmd
    }

    fn ocdc_process(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(assert_cmd::cargo::cargo_bin("ocdc"));
        cmd.env("HOME", self.home.path())
            .env("OCDC_CACHE_DIR", self.state_dir())
            .env("OCDC_CLONES_DIR", self.clones())
            .env("OCDC_PORT_START", "19400")
            .env("OCDC_PORT_END", "19420")
            .env_remove("RUST_LOG");
        cmd
    }

    fn allocate(&self, path: &Path, repo: &str, branch: &str) -> u16 {
        let output = self
            .ocdc()
            .args(["port", "allocate"])
            .arg(path)
            .args(["--repo", repo, "--branch", branch])
            .output()
            .unwrap();
        assert!(output.status.success(), "allocate failed: {output:?}");
        String::from_utf8(output.stdout).unwrap().trim().parse().unwrap()
    }
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = Command::cargo_bin("ocdc").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("port"))
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("cleanup"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("ocdc").unwrap();
    cmd.arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_port_allocate_is_idempotent() {
    let env = Env::new();
    let ws = env.workspace("api/main");

    let first = env.allocate(&ws, "api", "main");
    let second = env.allocate(&ws, "api", "main");

    assert_eq!(first, second);
    assert!((19400..=19420).contains(&first));
    assert!(env.state_dir().join("ports.json").exists());
}

#[test]
fn test_concurrent_processes_get_distinct_ports() {
    let env = Env::new();
    let workspaces: Vec<PathBuf> = (0..8)
        .map(|i| env.workspace(&format!("api/pr-{i}")))
        .collect();

    let children: Vec<_> = workspaces
        .iter()
        .enumerate()
        .map(|(i, ws)| {
            env.ocdc_process()
                .args(["port", "allocate"])
                .arg(ws)
                .args(["--repo", "api", "--branch", &format!("pr-{i}")])
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .unwrap()
        })
        .collect();

    let mut ports = HashSet::new();
    for child in children {
        let output = child.wait_with_output().unwrap();
        assert!(output.status.success(), "allocate failed: {output:?}");
        let port: u16 = String::from_utf8(output.stdout).unwrap().trim().parse().unwrap();
        assert!((19400..=19420).contains(&port));
        ports.insert(port);
    }
    assert_eq!(ports.len(), workspaces.len());

    let output = env.ocdc().args(["port", "list", "--json"]).output().unwrap();
    assert!(output.status.success());
    let listed: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed.len(), workspaces.len());
    let listed_ports: HashSet<u16> = listed
        .iter()
        .map(|entry| entry["port"].as_u64().unwrap() as u16)
        .collect();
    assert_eq!(listed_ports, ports);
}

#[test]
fn test_port_list_and_release() {
    let env = Env::new();
    let ws = env.workspace("api/feature");
    env.allocate(&ws, "api", "feature-x");

    env.ocdc()
        .args(["port", "list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"branch\": \"feature-x\""))
        .stdout(predicate::str::contains(ws.to_string_lossy().as_ref()));

    env.ocdc()
        .args(["port", "release"])
        .arg(&ws)
        .assert()
        .success()
        .stdout(predicate::str::contains("Released port"));

    env.ocdc()
        .args(["port", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No workspaces have ports assigned"));
}

#[test]
fn test_resolve_branch_to_path() {
    let env = Env::new();
    let ws = env.workspace("web/release");
    env.allocate(&ws, "web", "release-1.2");

    env.ocdc()
        .args(["resolve", "release-1.2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(ws.to_string_lossy().as_ref()));
}

#[test]
fn test_resolve_unknown_branch_fails() {
    let env = Env::new();

    env.ocdc()
        .args(["resolve", "does-not-exist"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: No workspace matches"));
}

#[test]
fn test_cleanup_queue_round_trip() {
    let env = Env::new();
    let ws = env.workspace("api/pr-12");

    env.ocdc()
        .args(["cleanup", "add", "api-pr-12", "--reason", "merged", "--delay", "1h"])
        .arg("--clone-path")
        .arg(&ws)
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued cleanup for api-pr-12"));

    env.ocdc()
        .args(["cleanup", "add", "api-pr-12", "--reason", "closed"])
        .arg("--clone-path")
        .arg(&ws)
        .assert()
        .success()
        .stdout(predicate::str::contains("already queued"));

    env.ocdc()
        .args(["cleanup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api-pr-12\tmerged"));

    env.ocdc()
        .args(["cleanup", "ready"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleanup queue is empty"));

    env.ocdc()
        .args(["cleanup", "remove", "api-pr-12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed api-pr-12"));
}

#[test]
fn test_cleanup_add_stores_absolute_clone_path() {
    let env = Env::new();
    let ws = env.workspace("api/pr-7");

    env.ocdc()
        .current_dir(env.home.path())
        .args(["cleanup", "add", "api-pr-7", "--reason", "merged"])
        .args(["--clone-path", "clones/api/pr-7"])
        .assert()
        .success();

    env.ocdc()
        .args(["cleanup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("\t{}", ws.display())));
}

#[test]
fn test_sweep_keeps_refused_removal_queued() {
    let env = Env::new();
    let outside = TempDir::new().unwrap();

    env.ocdc()
        .args(["cleanup", "add", "stray", "--reason", "closed", "--delay", "0s"])
        .arg("--clone-path")
        .arg(outside.path())
        .assert()
        .success();

    env.ocdc()
        .args(["cleanup", "sweep", "--action", "remove_clone", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"retained\": 1"));

    assert!(outside.path().exists());
    env.ocdc()
        .args(["cleanup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stray"));
}

#[test]
fn test_sweep_removes_finished_items() {
    let env = Env::new();
    let gone = env.clones().join("api/pr-99");

    env.ocdc()
        .args(["cleanup", "add", "api-pr-99", "--reason", "merged", "--delay", "0s"])
        .arg("--clone-path")
        .arg(&gone)
        .assert()
        .success();

    env.ocdc()
        .args(["cleanup", "sweep", "--action", "kill_session,stop_container"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 removed"));

    env.ocdc()
        .args(["cleanup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleanup queue is empty"));
}

#[test]
fn test_check_unknown_source_type_does_not_enqueue() {
    let env = Env::new();
    let ws = env.workspace("api/ticket");

    env.ocdc()
        .args([
            "cleanup",
            "check",
            "api-ticket-1",
            "--source-type",
            "linear",
            "--source-url",
            "https://linear.app/acme/issue/ENG-1",
        ])
        .arg("--clone-path")
        .arg(&ws)
        .assert()
        .success()
        .stdout(predicate::str::contains("does not need cleanup"));
}

#[test]
fn test_invalid_sweep_action_is_rejected() {
    let env = Env::new();

    env.ocdc()
        .args(["cleanup", "sweep", "--action", "remove_everything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown cleanup action"));
}

#[test]
fn test_inverted_port_range_in_config_fails() {
    let env = Env::new();
    let config = env.home.path().join("config.yaml");
    std::fs::write(&config, "ports:\n  range_start: 14000\n  range_end: 13000\n").unwrap();

    let mut cmd = Command::cargo_bin("ocdc").unwrap();
    cmd.env("HOME", env.home.path())
        .env("OCDC_CACHE_DIR", env.state_dir())
        .env_remove("OCDC_PORT_START")
        .env_remove("OCDC_PORT_END")
        .args(["--config"])
        .arg(&config)
        .args(["port", "list"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("port range start 14000"));
}

#[test]
fn test_missing_config_file_fails() {
    let env = Env::new();

    env.ocdc()
        .args(["--config", "/nonexistent/ocdc.yaml", "port", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}
