//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. Each test
//! points the config directory at its own temp dir.

use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Run a CLI command with `config_dir` as the config directory and return output.
fn run_cli(config_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "meeetimer-cli", "--"])
        .args(args)
        .env("MEEETIMER_CONFIG_DIR", config_dir)
        .env_remove("MEEETIMER_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn parse_json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("stdout is not JSON")
}

#[test]
fn test_validate_normalizes_thresholds() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        dir.path(),
        &[
            "validate", "-d", "60", "-a", "10", "-a", "10", "-a", "70", "-a", "0",
        ],
    );
    assert_eq!(code, 0, "validate failed");
    let value = parse_json(&stdout);
    assert_eq!(value["totalDurationSeconds"], 60);
    assert_eq!(value["alertThresholds"], serde_json::json!([10]));
}

#[test]
fn test_validate_accepts_units() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        dir.path(),
        &[
            "validate", "-d", "15m", "-a", "1m", "-a", "10m", "-a", "5m", "-a", "2m",
        ],
    );
    assert_eq!(code, 0, "validate failed");
    let value = parse_json(&stdout);
    assert_eq!(value["totalDurationSeconds"], 900);
    assert_eq!(value["alertThresholds"], serde_json::json!([600, 300, 60]));
}

#[test]
fn test_validate_rejects_zero_duration() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["validate", "-d", "0"]);
    assert_ne!(code, 0, "zero duration should be rejected");
    assert!(stderr.contains("at least 1 second"));
}

#[test]
fn test_preset_list() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["preset", "list"]);
    assert_eq!(code, 0, "preset list failed");
    let value = parse_json(&stdout);
    let presets = value.as_array().expect("preset list is an array");
    assert_eq!(presets.len(), 4);
    assert_eq!(presets[0]["minutes"], 10);
    assert_eq!(
        presets[0]["settings"]["alertThresholds"],
        serde_json::json!([300, 60])
    );
}

#[test]
fn test_config_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(
        dir.path(),
        &["config", "set", "notifications.stagger_ms", "250"],
    );
    assert_eq!(code, 0, "config set failed");

    let (code, stdout, _) = run_cli(
        dir.path(),
        &["config", "get", "notifications.stagger_ms"],
    );
    assert_eq!(code, 0, "config get failed");
    assert_eq!(stdout.trim(), "250");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "timer.nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown config key"));
}

#[test]
fn test_run_finishes_without_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        dir.path(),
        &["run", "-d", "2", "-a", "1", "--no-notify", "--json"],
    );
    assert_eq!(code, 0, "run failed");
    let last = stdout.lines().last().expect("run printed snapshots");
    let state = parse_json(last);
    assert_eq!(state["phase"], "finished");
    assert_eq!(state["remainingSeconds"], 0);
    assert_eq!(state["triggeredThresholds"], serde_json::json!([1]));
}

#[test]
fn test_config_rejected_timer_value_keeps_previous() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(
        dir.path(),
        &["config", "set", "timer.total_duration_seconds", "900"],
    );
    assert_eq!(code, 0, "config set failed");

    let (code, _, stderr) = run_cli(
        dir.path(),
        &["config", "set", "timer.total_duration_seconds", "0"],
    );
    assert_ne!(code, 0, "zero duration should be rejected");
    assert!(stderr.contains("at least 1 second"));

    let (code, stdout, _) = run_cli(
        dir.path(),
        &["config", "get", "timer.total_duration_seconds"],
    );
    assert_eq!(code, 0, "config get failed");
    assert_eq!(stdout.trim(), "900");
    let file = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(file.contains("total_duration_seconds = 900"));
}

#[test]
fn test_run_exits_after_finish_with_idle_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_meeetimer"))
        .args(["run", "-d", "2", "--no-notify", "--json"])
        .env("MEEETIMER_CONFIG_DIR", dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn CLI");
    // Held open and never written, like an idle terminal.
    let stdin = child.stdin.take();

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break Some(status);
        }
        if Instant::now() > deadline {
            break None;
        }
        thread::sleep(Duration::from_millis(100));
    };
    if status.is_none() {
        let _ = child.kill();
        let _ = child.wait();
    }
    drop(stdin);

    let status = status.expect("run did not exit after the countdown finished");
    assert!(status.success());
}
