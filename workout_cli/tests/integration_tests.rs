//! Integration tests for the workout-logger binary.
//!
//! These tests verify end-to-end behavior including:
//! - Logging workouts and notes to the partitioned store
//! - Push-based ingestion with message deduplication
//! - Verification, display and CSV export

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI isolated from the user's config, pointed at `temp_dir/db`
fn cli(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("workout-logger"));
    cmd.env("XDG_CONFIG_HOME", temp_dir.path().join("config"))
        .env_remove("WORKOUT_LOGGER_DB")
        .env_remove("RUST_LOG")
        .arg("--db-dir")
        .arg(db_dir(temp_dir))
        .arg("--state-dir")
        .arg(temp_dir.path().join("state"));
    cmd
}

fn db_dir(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("db")
}

fn read_lines(path: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .expect("Failed to read partition")
        .lines()
        .map(|line| serde_json::from_str(line).expect("Invalid JSON line"))
        .collect()
}

fn log(temp_dir: &TempDir, words: &[&str]) {
    cli(temp_dir)
        .args(["log", "--no-commit", "--date", "2026-02-16"])
        .args(words)
        .assert()
        .success();
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("workout-logger"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Parse free-text workout logs into a JSONL store",
        ));
}

#[test]
fn test_log_writes_partition() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["log", "--no-commit", "--date", "2026-02-16"])
        .args(["squat", "315x5x3", "rpe8", "felt", "strong"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[2026-02-16] Squat: 315x5x3 @ RPE 8 - \"felt strong\"",
        ))
        .stdout(predicate::str::contains("✓ Logged to"));

    let records = read_lines(&db_dir(&temp_dir).join("2026/02/16.jsonl"));
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record["type"], "strength");
    assert_eq!(record["exercise"], "squat");
    assert_eq!(record["unit"], "lb");
    assert_eq!(record["rpe"], 8);
    assert_eq!(record["notes"], "felt strong");
    assert_eq!(record["source"], "cli");
    assert_eq!(record["raw"], "squat 315x5x3 rpe8 felt strong");
    assert_eq!(record["sets"].as_array().unwrap().len(), 5);
    assert_eq!(record["sets"][0]["weight"], 315.0);
    assert_eq!(record["sets"][0]["reps"], 3);
    assert!(record["ts"].as_str().unwrap().starts_with("2026-02-16T"));
}

#[test]
fn test_log_appends_to_same_day() {
    let temp_dir = setup_test_dir();

    log(&temp_dir, &["pull-up", "20,20,25"]);
    log(&temp_dir, &["deadlift", "405", "2,1,x"]);

    let records = read_lines(&db_dir(&temp_dir).join("2026/02/16.jsonl"));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["type"], "bodyweight");
    assert!(records[0].get("unit").is_none());
    assert_eq!(records[1]["sets"][2]["failed"], true);
    assert_eq!(records[1]["sets"][2]["reps"], 0);
}

#[test]
fn test_dry_run_does_not_write() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["log", "--dry-run", "--date", "2026-02-16"])
        .args(["treadmill", "10min", "3.2mph", "incline15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"cardio\""))
        .stdout(predicate::str::contains("\"speed_mph\": 3.2"))
        .stdout(predicate::str::contains("Dry run: would save to"));

    assert!(!db_dir(&temp_dir).exists());
}

#[test]
fn test_unknown_exercise_fails_without_writing() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["log", "--no-commit", "zumba", "3x10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("❌"))
        .stderr(predicate::str::contains("Unknown exercise: \"zumba\""));

    assert!(!db_dir(&temp_dir).exists());
}

#[test]
fn test_unparseable_format_fails() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["log", "--no-commit", "squat", "heavy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not parse format"));
}

#[test]
fn test_note_command() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["note", "--no-commit", "--date", "2026-02-16"])
        .args(["Felt", "tired", "today"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Note: \"Felt tired today\""));

    let records = read_lines(&db_dir(&temp_dir).join("2026/02/16.jsonl"));
    assert_eq!(records[0]["type"], "note");
    assert_eq!(records[0]["notes"], "Felt tired today");
    assert_eq!(records[0]["raw"], "/note Felt tired today");
}

#[test]
fn test_note_text_starting_with_notes_word() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["note", "--no-commit", "--date", "2026-02-16"])
        .args(["/notes", "from", "coach"])
        .assert()
        .success();

    cli(&temp_dir)
        .args(["note", "--no-commit", "--date", "2026-02-16"])
        .args(["/note", "already", "prefixed"])
        .assert()
        .success();

    let records = read_lines(&db_dir(&temp_dir).join("2026/02/16.jsonl"));
    assert_eq!(records[0]["notes"], "/notes from coach");
    assert_eq!(records[0]["raw"], "/note /notes from coach");
    assert_eq!(records[1]["notes"], "already prefixed");
    assert_eq!(records[1]["raw"], "/note already prefixed");
}

#[test]
fn test_ingest_requires_prefix() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["ingest", "--no-commit", "--message-id", "1", "squat 315x5x3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Message must start with /log or /note"));

    assert!(!temp_dir.path().join("state/processed_messages.json").exists());
}

#[test]
fn test_ingest_skips_duplicate_message() {
    let temp_dir = setup_test_dir();

    for _ in 0..2 {
        cli(&temp_dir)
            .args(["ingest", "--no-commit", "--date", "2026-02-16"])
            .args(["--message-id", "555", "/log bench 225x5x3"])
            .assert()
            .success();
    }

    cli(&temp_dir)
        .args(["ingest", "--no-commit", "--date", "2026-02-16"])
        .args(["--message-id", "555", "/log bench 225x5x3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Message 555 already processed"));

    let records = read_lines(&db_dir(&temp_dir).join("2026/02/16.jsonl"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["source"], "telegram");
    assert_eq!(records[0]["raw"], "/log bench 225x5x3");
}

#[test]
fn test_verify_clean_and_tampered() {
    let temp_dir = setup_test_dir();

    log(&temp_dir, &["squat", "315x5x3", "rpe8"]);
    log(&temp_dir, &["yesterday:", "db", "bench", "2x90", "4x10,7"]);

    cli(&temp_dir)
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("Checked 2 records in 2 files"))
        .stdout(predicate::str::contains("✓ All records match"));

    // Hand-edit the stored rpe
    let path = db_dir(&temp_dir).join("2026/02/16.jsonl");
    let tampered = fs::read_to_string(&path)
        .unwrap()
        .replace("\"rpe\":8", "\"rpe\":6");
    fs::write(&path, tampered).unwrap();

    cli(&temp_dir)
        .arg("verify")
        .assert()
        .failure()
        .stdout(predicate::str::contains("rpe differs"))
        .stderr(predicate::str::contains(
            "Verification found 1 mismatched record(s)",
        ));
}

#[test]
fn test_show_range() {
    let temp_dir = setup_test_dir();

    log(&temp_dir, &["squat", "315x5x3"]);
    log(&temp_dir, &["yesterday", "pull-up", "20,20,25"]);

    cli(&temp_dir)
        .args(["show", "--date", "2026-02-16", "--days", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[2026-02-15] Pull Up: 20, 20, 25 reps"))
        .stdout(predicate::str::contains("[2026-02-16] Squat: 315x5x3"));

    cli(&temp_dir)
        .args(["show", "--date", "2026-02-14"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No records between"));
}

#[test]
fn test_show_rejects_oversized_range() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["show", "--date", "2026-02-16", "--days", "4000000000"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("❌"))
        .stderr(predicate::str::contains("reaches before the earliest date"));
}

#[test]
fn test_format_stdin_skips_bad_lines() {
    let temp_dir = setup_test_dir();
    let input = concat!(
        r#"{"ts":"2026-02-16T10:30:00-08:00","type":"strength","exercise":"squat","unit":"lb","sets":[{"weight":315.0,"reps":5}],"source":"cli","raw":"squat 315x5"}"#,
        "\n",
        "not json\n",
        r#"{"ts":"2026-02-16T11:00:00-08:00","type":"note","notes":"rest","source":"cli","raw":"/note rest"}"#,
        "\n",
    );

    cli(&temp_dir)
        .arg("format")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("[2026-02-16] Squat: 315x5"))
        .stdout(predicate::str::contains("[2026-02-16] Note: \"rest\""));
}

#[test]
fn test_export_csv() {
    let temp_dir = setup_test_dir();
    log(&temp_dir, &["deadlift", "405", "2,1,x"]);

    let output = temp_dir.path().join("export.csv");
    cli(&temp_dir)
        .args(["export", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Exported 3 rows"));

    let csv = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("date,ts,type,exercise,set,weight"));
    assert!(lines[3].contains(",deadlift,3,405.0,lb,0,true,"));
}

#[test]
fn test_invalid_date_override() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["log", "--no-commit", "--date", "02/16/2026", "squat", "315x5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not parse date"));
}
