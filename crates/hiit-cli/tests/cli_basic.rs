//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary home
//! directory so config and plans never leak between tests.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_hiit"))
        .args(args)
        .env("HOME", home)
        .env_remove("HIIT_ENV")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn preview_json(home: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["timer", "preview", "--json"];
    full.extend_from_slice(args);
    let (code, stdout, stderr) = run_cli(home, &full);
    assert_eq!(code, 0, "preview failed: {stderr}");
    serde_json::from_str(&stdout).expect("preview output is JSON")
}

#[test]
fn test_preview_default_session() {
    let home = tempfile::tempdir().unwrap();
    let out = preview_json(home.path(), &["--work", "45", "--rest", "15", "--rounds", "3"]);
    assert_eq!(out["total_rounds"], 3);
    assert_eq!(out["total_duration_secs"], 45 * 3 + 15 * 2);
    assert_eq!(out["rest_policy"], "skip_trailing_rest");

    let phases: Vec<&str> = out["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["phase"].as_str().unwrap())
        .collect();
    assert_eq!(
        phases,
        vec!["warmup", "work", "rest", "work", "rest", "work"]
    );
}

#[test]
fn test_preview_clamps_and_rests_after_final_round() {
    let home = tempfile::tempdir().unwrap();
    let out = preview_json(
        home.path(),
        &["--work", "1", "--rest", "999", "--rounds", "2", "--rest-after-final-round"],
    );
    assert_eq!(out["total_duration_secs"], 5 * 2 + 300 * 2);
    assert_eq!(out["steps"].as_array().unwrap().len(), 5);
}

#[test]
fn test_preview_text() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["timer", "preview", "--rounds", "2"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("2 rounds"));
}

#[test]
fn test_config_get_set() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "timer.work_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "45");

    // Out-of-range values are clamped, not rejected.
    let (code, stdout, _) = run_cli(home.path(), &["config", "set", "timer.work_secs", "900"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "300");

    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "timer.work_secs"]);
    assert_eq!(stdout.trim(), "300");

    let out = preview_json(home.path(), &["--rounds", "1"]);
    assert_eq!(out["total_duration_secs"], 300);
}

#[test]
fn test_config_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["config", "set", "timer.nope", "1"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_config_list_is_json() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "list"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["cues"]["countdown_offsets"], serde_json::json!([3, 2, 1]));
}

#[test]
fn test_plan_lifecycle() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        home.path(),
        &[
            "plan", "add", "Legs", "--work", "40", "--rest", "20", "-e", "Squat", "-e", "Lunge",
        ],
    );
    assert_eq!(code, 0);
    assert!(stdout.starts_with("saved:"));

    let (code, stdout, _) = run_cli(home.path(), &["plan", "list", "--json"]);
    assert_eq!(code, 0);
    let plans: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(plans.as_array().unwrap().len(), 1);
    assert_eq!(plans[0]["exercises"], serde_json::json!(["Squat", "Lunge"]));

    // A plan's exercises set the round count; its times win over config.
    let out = preview_json(home.path(), &["--plan", "legs", "--rounds", "9"]);
    assert_eq!(out["total_rounds"], 2);
    assert_eq!(out["total_duration_secs"], 40 * 2 + 20);
    assert_eq!(out["steps"][1]["exercise"], "Squat");

    let (code, stdout, _) = run_cli(home.path(), &["plan", "remove", "LEGS"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Legs"));

    let (_, stdout, _) = run_cli(home.path(), &["plan", "list"]);
    assert!(stdout.contains("no saved plans"));
    assert!(stdout.contains("plans.toml"));
}

#[test]
fn test_unknown_plan_fails() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["timer", "preview", "--plan", "ghost"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("ghost"));
}

#[test]
fn test_timer_run_json_completes() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli(
        home.path(),
        &["timer", "run", "--json", "--work", "5", "--rest", "5", "--rounds", "1"],
    );
    assert_eq!(code, 0, "timer run failed: {stderr}");

    let events: Vec<serde_json::Value> = stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("each line is a JSON event"))
        .collect();
    let types: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();

    assert_eq!(types.first(), Some(&"timer_started"));
    assert_eq!(events[0]["total_rounds"], 1);
    assert_eq!(events[0]["total_duration_secs"], 5);
    assert_eq!(types.iter().filter(|t| **t == "workout_completed").count(), 1);
    assert_eq!(types.last(), Some(&"timer_stopped"));
    assert_eq!(events.last().unwrap()["reason"], "completed");

    let phases: Vec<&str> = events
        .iter()
        .filter(|e| e["type"] == "phase_changed")
        .map(|e| e["to"].as_str().unwrap())
        .collect();
    assert_eq!(phases, vec!["work", "complete"]);
}
