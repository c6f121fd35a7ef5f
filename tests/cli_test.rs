use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_cli_usage() {
    let mut cmd = Command::new(cargo_bin!("conformd"));
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--request-dir"))
        .stdout(predicate::str::contains("--participant-id"));
}

#[test]
fn test_cli_requires_directories() {
    let mut cmd = Command::new(cargo_bin!("conformd"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}
