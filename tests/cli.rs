use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;

// `workpool -V` should print the version
#[test]
fn cli_version() {
    Command::cargo_bin("workpool")
        .unwrap()
        .args(["-V"])
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_runs_all_tasks() {
    Command::cargo_bin("workpool")
        .unwrap()
        .args(["--workers", "4", "--tasks", "12", "--task-ms", "1"])
        .assert()
        .success()
        .stdout(contains("workers:   4"))
        .stdout(contains("completed: 12"))
        .stdout(contains("faulted:   0"));
}

#[test]
fn cli_non_positive_workers_run_with_one() {
    for workers in ["0", "-3"] {
        Command::cargo_bin("workpool")
            .unwrap()
            .args(["--workers", workers, "--tasks", "3", "--task-ms", "1"])
            .assert()
            .success()
            .stdout(contains("workers:   1"))
            .stdout(contains("completed: 3"));
    }
}

#[test]
fn cli_injected_faults_are_absorbed() {
    Command::cargo_bin("workpool")
        .unwrap()
        .args([
            "--workers",
            "2",
            "--tasks",
            "10",
            "--task-ms",
            "1",
            "--fail-every",
            "3",
        ])
        .assert()
        .success()
        .stdout(contains("completed: 7"))
        .stdout(contains("faulted:   3"));
}

#[test]
fn cli_json_report() {
    Command::cargo_bin("workpool")
        .unwrap()
        .args(["--workers", "2", "--tasks", "5", "--task-ms", "0", "--json"])
        .assert()
        .success()
        .stdout(contains(r#""workers":2"#))
        .stdout(contains(r#""completed":5"#))
        .stdout(contains(r#""faulted":0"#))
        .stdout(contains(r#""elapsed_ms":"#));
}

#[test]
fn cli_no_tasks() {
    Command::cargo_bin("workpool")
        .unwrap()
        .args(["--tasks", "0"])
        .assert()
        .success()
        .stdout(contains("completed: 0"));
}

#[test]
fn cli_invalid_argument() {
    Command::cargo_bin("workpool")
        .unwrap()
        .args(["--tasks", "many"])
        .assert()
        .failure();
}
