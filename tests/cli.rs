use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_the_subcommands() {
    Command::cargo_bin("phonodrill")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("session"))
        .stdout(predicate::str::contains("vowels"));
}

#[test]
fn out_of_range_speed_is_rejected() {
    Command::cargo_bin("phonodrill")
        .unwrap()
        .args(["session", "--speed", "11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn vowels_prints_the_scaled_inventory() {
    Command::cargo_bin("phonodrill")
        .unwrap()
        .args(["vowels", "--gender", "female", "--age", "child"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scale factor: x1.78"))
        .stdout(predicate::str::contains("beet"));
}

#[test]
fn zero_duration_session_prints_a_summary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(r#"[{"text": "Bat", "phonetic": "bæt", "vowels": []}]"#.as_bytes())
        .unwrap();

    Command::cargo_bin("phonodrill")
        .unwrap()
        .args(["session", "--duration", "0", "--words-file"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Session summary"));
}
