use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{TempDir, tempdir};

const PAIR_ATLAS: &str = r#"
water_bodies:
  - { id: Q97, name: "Atlantic Ocean" }
countries:
  - { id: Q45, name: Portugal, population: 10467366, waters: [Q97] }
  - { id: Q27, name: Ireland, population: 5149139, waters: [Q97] }
"#;

fn write_atlas(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("atlas.yaml");
    fs::write(&path, PAIR_ATLAS).expect("write atlas");
    path
}

fn geoquiz(atlas: &Path) -> Command {
    let mut cmd = Command::cargo_bin("geoquiz").expect("binary built");
    cmd.env_remove("RUST_LOG")
        .arg("--atlas")
        .arg(atlas)
        .arg("--seed")
        .arg("1");
    cmd
}

#[test]
fn validate_only_accepts_defaults() {
    Command::cargo_bin("geoquiz")
        .expect("binary built")
        .arg("--validate-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration is valid"));
}

#[test]
fn invalid_endpoint_is_reported() {
    Command::cargo_bin("geoquiz")
        .expect("binary built")
        .args(["--validate-only", "--endpoint", "ftp://example.org"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("knowledge_base.endpoint"));
}

#[test]
fn structured_logging_announces_its_file() {
    let dir = tempdir().expect("temp dir");
    let log = dir.path().join("logs/geoquiz.log");
    let config = dir.path().join("geoquiz.yaml");
    fs::write(
        &config,
        format!(
            "logging:\n  enable_structured: true\n  file: {}\n",
            log.display()
        ),
    )
    .expect("write config");

    Command::cargo_bin("geoquiz")
        .expect("binary built")
        .arg("--config")
        .arg(&config)
        .arg("--validate-only")
        .assert()
        .success()
        .stderr(predicate::str::contains(format!(
            "Structured logs: {}",
            log.display()
        )));
    assert!(log.exists());
}

#[test]
fn lists_atlas_countries_by_name() {
    let dir = tempdir().expect("temp dir");
    let atlas = write_atlas(&dir);
    geoquiz(&atlas)
        .arg("--list-countries")
        .assert()
        .success()
        .stdout("Ireland (Q27)\nPortugal (Q45)\n");
}

#[test]
fn rejecting_the_guess_wins_with_the_other_country() {
    let dir = tempdir().expect("temp dir");
    let atlas = write_atlas(&dir);
    let transcript = dir.path().join("out/transcript.jsonl");
    geoquiz(&atlas)
        .args(["--bounds", "trivial"])
        .arg("--transcript")
        .arg(&transcript)
        .write_stdin("maybe\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("QUESTION 1! 2 countries are left."))
        .stdout(predicate::str::contains("Is your country "))
        .stdout(predicate::str::contains("Found after 1 question."));

    let rows = fs::read_to_string(&transcript).expect("transcript written");
    assert_eq!(rows.lines().count(), 1);
    let row: serde_json::Value = serde_json::from_str(rows.trim()).expect("json row");
    assert_eq!(row["bound"], "trivial");
    assert_eq!(row["answer"], false);
}

#[test]
fn denying_the_only_water_body_is_a_contradiction() {
    let dir = tempdir().expect("temp dir");
    let atlas = write_atlas(&dir);
    geoquiz(&atlas)
        .args(["--bounds", "adjacency"])
        .write_stdin("no\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Is your country located in or next to Atlantic Ocean?",
        ))
        .stdout(predicate::str::contains("No country matches all of your answers"));
}

#[test]
fn closed_stdin_aborts_with_a_diagnostic() {
    let dir = tempdir().expect("temp dir");
    let atlas = write_atlas(&dir);
    geoquiz(&atlas)
        .args(["--bounds", "population"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read an answer"));
}
