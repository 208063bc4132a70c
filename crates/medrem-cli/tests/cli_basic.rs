//! Basic CLI E2E tests.
//!
//! Tests invoke the built `medrem` binary against a temporary data directory
//! and verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_medrem"))
        .args(args)
        .env("MEDREM_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("stdout is JSON")
}

fn add_metformin(dir: &Path) -> i64 {
    let (code, stdout, stderr) = run_cli(
        dir,
        &[
            "reminder",
            "add",
            "Metformin",
            "--dosage",
            "500mg",
            "--slot",
            "morning/after/08:00",
            "--start",
            "2024-06-01",
        ],
    );
    assert_eq!(code, 0, "reminder add failed: {stderr}");
    let event = json(&stdout);
    assert_eq!(event["type"], "reminder_added");
    event["reminder"]["id"].as_i64().expect("numeric id")
}

#[test]
fn test_reminder_add_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let id = add_metformin(dir.path());

    let (code, stdout, _) = run_cli(dir.path(), &["reminder", "list"]);
    assert_eq!(code, 0);
    let list = json(&stdout);
    let reminders = list.as_array().unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0]["id"], id);
    assert_eq!(reminders[0]["medicineName"], "Metformin");
    assert_eq!(reminders[0]["schedule"][0]["specificTime"], "08:00");
    assert_eq!(reminders[0]["isActive"], true);

    let raw = std::fs::read_to_string(dir.path().join("medicineReminders.json")).unwrap();
    assert!(raw.contains("\"medicineName\""));
}

#[test]
fn test_reminder_list_plain() {
    let dir = tempfile::tempdir().unwrap();
    add_metformin(dir.path());

    let (code, stdout, _) = run_cli(dir.path(), &["reminder", "list", "--plain"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Metformin - 500mg"));
    assert!(stdout.contains("Morning at 8:00 AM (After Meal)"));
}

#[test]
fn test_reminder_toggle_and_remove() {
    let dir = tempfile::tempdir().unwrap();
    let id = add_metformin(dir.path()).to_string();

    let (code, stdout, _) = run_cli(dir.path(), &["reminder", "toggle", &id]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout)["is_active"], false);

    let (code, stdout, _) = run_cli(dir.path(), &["reminder", "resume", &id]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout)["is_active"], true);

    let (code, stdout, _) = run_cli(dir.path(), &["reminder", "remove", &id]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout)["type"], "reminder_removed");

    let (_, stdout, _) = run_cli(dir.path(), &["reminder", "list"]);
    assert_eq!(json(&stdout), serde_json::json!([]));
}

#[test]
fn test_reminder_edit_keeps_unspecified_fields() {
    let dir = tempfile::tempdir().unwrap();
    let id = add_metformin(dir.path()).to_string();

    let (code, stdout, stderr) = run_cli(
        dir.path(),
        &["reminder", "edit", &id, "--dosage", "850mg"],
    );
    assert_eq!(code, 0, "edit failed: {stderr}");
    let event = json(&stdout);
    assert_eq!(event["reminder"]["dosage"], "850mg");
    assert_eq!(event["reminder"]["medicineName"], "Metformin");
    assert_eq!(event["reminder"]["schedule"][0]["specificTime"], "08:00");
}

#[test]
fn test_next_reports_upcoming_dose() {
    let dir = tempfile::tempdir().unwrap();
    add_metformin(dir.path());

    let (code, stdout, _) = run_cli(dir.path(), &["next"]);
    assert_eq!(code, 0);
    let event = json(&stdout);
    assert_eq!(event["type"], "next_reminder");
    let minutes = event["next"]["minutes_until"].as_u64().unwrap();
    assert!(minutes < 1440);
}

#[test]
fn test_next_with_no_reminders() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["next", "--plain"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "No upcoming doses.");
}

#[test]
fn test_check_runs_once() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["check"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().is_empty());
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();

    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "polling.due_check_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "10");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "notifications.sound", "false"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "notifications.sound"]);
    assert_eq!(stdout.trim(), "false");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "polling.due_check_secs", "0"]);
    assert_eq!(code, 1);
}

#[test]
fn test_errors_exit_nonzero() {
    let dir = tempfile::tempdir().unwrap();

    let (code, _, stderr) = run_cli(dir.path(), &["reminder", "remove", "42"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (code, _, _) = run_cli(
        dir.path(),
        &["reminder", "add", "Aspirin", "--dosage", "100mg"],
    );
    assert_eq!(code, 1, "once-daily reminder without a slot must be rejected");

    let (code, _, _) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
}
