//! Integration tests for the flexion binary.
//!
//! These tests verify end-to-end behavior including:
//! - The session workflow (start/add/begin/end/cancel)
//! - Recovery status rendering
//! - CSV rollup operations
//! - Persistence across invocations

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("flexion"))
}

fn run(data_dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    cli().args(args).arg("--data-dir").arg(data_dir).assert()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Muscle recovery and workout session tracker",
        ));
}

#[test]
fn test_status_on_fresh_dir_shows_all_ready() {
    let temp_dir = setup_test_dir();

    run(temp_dir.path(), &["status"])
        .success()
        .stdout(predicate::str::contains("MUSCLE RECOVERY"))
        .stdout(predicate::str::contains("ready"));
}

#[test]
fn test_full_workout_flow() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["start", "Leg Day"])
        .success()
        .stdout(predicate::str::contains("Configuring workout 'Leg Day'"));

    run(data_dir, &["add", "Squat", "--sets", "3x5"])
        .success()
        .stdout(predicate::str::contains("Quadriceps"));

    run(data_dir, &["begin"]).success();

    run(data_dir, &["end"])
        .success()
        .stdout(predicate::str::contains("complete"))
        .stdout(predicate::str::contains("Recovery timers reset"));

    // Workout was journaled
    let journal_path = data_dir.join("journal/workouts.jsonl");
    let journal = fs::read_to_string(&journal_path).expect("Failed to read journal");
    assert!(journal.contains("Leg Day"));
    assert!(journal.contains("quads"));

    // Status now shows the legs recovering
    run(data_dir, &["status"])
        .success()
        .stdout(predicate::str::contains("h left"));
}

#[test]
fn test_end_without_exercises_is_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["start", "Empty"]).success();
    run(data_dir, &["begin"]).success();

    run(data_dir, &["end"])
        .failure()
        .stderr(predicate::str::contains("no exercises"));

    // The session survives the rejected transition
    run(data_dir, &["status"])
        .success()
        .stdout(predicate::str::contains("Empty"));
}

#[test]
fn test_cancel_leaves_no_recovery_state() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["start", "Abandoned"]).success();
    run(data_dir, &["add", "Bench Press", "--sets", "3x8"]).success();
    run(data_dir, &["begin"]).success();
    run(data_dir, &["cancel"])
        .success()
        .stdout(predicate::str::contains("no timers touched"));

    // No journal entry, no cached recovery state
    assert!(!data_dir.join("journal/workouts.jsonl").exists());
    assert!(!data_dir.join("cache/session.json").exists());

    // Everything still fully recovered
    run(data_dir, &["status"])
        .success()
        .stdout(predicate::str::contains("h left").not());
}

#[test]
fn test_session_persists_across_invocations() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["start", "Split Session"]).success();

    // Each command is its own process; the checkpoint file carries state
    assert!(data_dir.join("cache/session.json").exists());

    run(data_dir, &["add", "Deadlift", "--sets", "5x3"]).success();
    run(data_dir, &["add", "Plank", "--sets", "3x1"]).success();
    run(data_dir, &["begin"]).success();
    run(data_dir, &["end"])
        .success()
        .stdout(predicate::str::contains("2 exercises"));
}

#[test]
fn test_double_start_is_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["start", "First"]).success();
    run(data_dir, &["start", "Second"])
        .failure()
        .stderr(predicate::str::contains("already in progress"));
}

#[test]
fn test_explicit_muscle_tags() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["start", "Tagged"]).success();
    run(
        data_dir,
        &["add", "Mystery Machine", "--sets", "3x10", "--muscles", "chest,triceps"],
    )
    .success()
    .stdout(predicate::str::contains("Chest"))
    .stdout(predicate::str::contains("Triceps"));
}

#[test]
fn test_rollup_creates_csv() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run(data_dir, &["start", "Push Day"]).success();
    run(data_dir, &["add", "Bench Press", "--sets", "3x8"]).success();
    run(data_dir, &["begin"]).success();
    run(data_dir, &["end"]).success();

    run(data_dir, &["rollup", "--cleanup"])
        .success()
        .stdout(predicate::str::contains("Rolled up 1 workouts"));

    assert!(data_dir.join("workouts.csv").exists());
    assert!(!data_dir.join("journal/workouts.jsonl").exists());

    // History still sees the archived workout
    run(data_dir, &["history"])
        .success()
        .stdout(predicate::str::contains("Push Day"));
}

#[test]
fn test_corrupt_recovery_cache_degrades_to_default() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::create_dir_all(data_dir.join("cache")).unwrap();
    fs::write(data_dir.join("cache/recovery.json"), "{ not json").unwrap();

    run(data_dir, &["status"])
        .success()
        .stdout(predicate::str::contains("MUSCLE RECOVERY"));
}

#[test]
fn test_history_on_empty_dir() {
    let temp_dir = setup_test_dir();

    run(temp_dir.path(), &["history"])
        .success()
        .stdout(predicate::str::contains("No workouts"));
}
