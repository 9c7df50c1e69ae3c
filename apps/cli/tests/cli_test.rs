//! Binary-level CLI tests. Nothing here talks to a provider.

use assert_cmd::Command;
use predicates::prelude::*;

fn tagsmith() -> Command {
    Command::cargo_bin("tagsmith").unwrap()
}

#[test]
fn help_lists_commands() {
    tagsmith()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("providers"));
}

#[test]
fn providers_lists_known_providers() {
    tagsmith()
        .arg("providers")
        .assert()
        .success()
        .stdout(predicate::str::contains("pollinations"))
        .stdout(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn run_rejects_missing_directory() {
    tagsmith()
        .args(["run", "/nonexistent/tagsmith-images"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read directory"));
}

#[test]
fn run_rejects_unknown_provider() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.png"), b"x").unwrap();
    tagsmith()
        .args(["run", dir.path().to_str().unwrap(), "--provider", "nonsense"])
        .assert()
        .failure();
}

#[test]
fn run_rejects_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    tagsmith()
        .args(["run", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no images found"));
}
