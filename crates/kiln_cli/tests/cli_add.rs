use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kiln"))
        .args(args)
        .env("KILN_STORE_PATH", store_path(dir))
        .env("KILN_CONFIG_PATH", dir.path().join("config.json"))
        .env("KILN_DISABLE_NOTIFICATIONS", "1")
        .env_remove("KILN_LOG")
        .output()
        .expect("failed to run kiln")
}

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("pieces.json")
}

fn stored(dir: &TempDir) -> serde_json::Value {
    let content = std::fs::read_to_string(store_path(dir)).expect("store written");
    serde_json::from_str(&content).expect("store is json")
}

#[test]
fn add_plain_text_reports_piece() {
    let dir = TempDir::new().unwrap();
    let output = run(&dir, &["add", "Tall vase", "--design", "vase"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Added piece: Tall vase (piece-"));
    assert!(!stdout.contains("Reminder set"));

    let store = stored(&dir);
    assert_eq!(store["schema_version"], 2);
    assert_eq!(store["pieces"][0]["status"], "In Progress");
    assert_eq!(store["pieces"][0]["design_type"], "Vase");
}

#[test]
fn add_firing_piece_with_timer_queues_reminder() {
    let dir = TempDir::new().unwrap();
    let output = run(
        &dir,
        &[
            "add",
            "Platter",
            "--status",
            "firing",
            "--clay",
            "cinco rojo",
            "--timer-days",
            "2",
            "--json",
        ],
    );

    assert!(output.status.success());
    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["status"], "Firing");
    assert_eq!(payload["clay_type"], "Cinco Rojo");
    assert_eq!(payload["timer"]["days"], 2);
    assert_eq!(payload["reminder_action"], "scheduled");
    assert_eq!(payload["timer_error"], serde_json::Value::Null);
    assert_eq!(payload["remaining"]["days"], 1);
    assert_eq!(payload["remaining"]["is_expired"], false);

    let store = stored(&dir);
    let reminders = store["reminders"].as_array().unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0]["piece_id"], payload["id"]);
    assert_eq!(reminders[0]["title"], "Firing Complete! 🎨");
    assert_eq!(
        reminders[0]["reminder_id"],
        payload["reminder"]["reminder_id"]
    );
}

#[test]
fn add_with_bad_timer_saves_and_warns() {
    let dir = TempDir::new().unwrap();
    let output = run(
        &dir,
        &["add", "Mug", "--status", "drying", "--timer-minutes", "0"],
    );

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("WARNING: piece saved without a reminder"));
    assert!(stderr.contains("non_positive_duration"));

    let store = stored(&dir);
    assert_eq!(store["pieces"].as_array().unwrap().len(), 1);
    assert_eq!(store["pieces"][0]["timer"]["minutes"], 0);
    assert!(store["reminders"].as_array().unwrap().is_empty());
}

#[test]
fn add_finished_piece_keeps_timer_without_reminder() {
    let dir = TempDir::new().unwrap();
    let output = run(
        &dir,
        &["add", "Bowl", "--status", "finished", "--timer-days", "3", "--json"],
    );

    assert!(output.status.success());
    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["reminder_action"], "unchanged");
    assert_eq!(payload["reminder"], serde_json::Value::Null);
    assert_eq!(payload["remaining"], serde_json::Value::Null);
}

#[test]
fn add_rejects_blank_name() {
    let dir = TempDir::new().unwrap();
    let output = run(&dir, &["add", "   "]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - name is required"));
    assert!(!store_path(&dir).exists());
}

#[test]
fn add_rejects_mixed_timer_inputs() {
    let dir = TempDir::new().unwrap();
    let output = run(
        &dir,
        &["add", "Tile", "--timer-days", "1", "--timer-minutes", "30"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}

#[test]
fn add_rejects_a_fourth_image() {
    let dir = TempDir::new().unwrap();
    let output = run(
        &dir,
        &[
            "add",
            "Vase",
            "--image",
            "file:///a.jpg|Front",
            "--image",
            "file:///b.jpg",
            "--image",
            "file:///c.jpg",
            "--image",
            "file:///d.jpg",
        ],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("at most 3 images"));
}

#[test]
fn add_rejects_unknown_clay() {
    let dir = TempDir::new().unwrap();
    let output = run(&dir, &["add", "Vase", "--clay", "granite"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}
