use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn missing_url_argument_exits_nonzero() {
    Command::cargo_bin("reelscribe")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_mentions_the_url_argument() {
    Command::cargo_bin("reelscribe")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("<URL>"))
        .stdout(predicate::str::contains("--mode"));
}
