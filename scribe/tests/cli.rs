//! CLI tests for the `scribe` binary.
//!
//! Spawns the binary and verifies exit codes and output for the paths that
//! never reach the model provider.

use std::process::Command;

use scribe::exit_codes;
use scribe::tasks::NO_STAGED_CHANGES;
use scribe::test_support::TestRepo;

const KEY_ENV: &str = "GOOGLE_GENERATIVE_AI_API_KEY";

fn scribe() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_scribe"));
    cmd.env_remove(KEY_ENV).env_remove("RUST_LOG");
    cmd
}

#[test]
fn commit_without_staged_changes_prints_notice_and_succeeds() {
    let repo = TestRepo::new().expect("repo");
    repo.write("a.ts", "a\n").expect("write");

    let output = scribe()
        .arg("commit")
        .arg(repo.path())
        .output()
        .expect("scribe commit");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(
        String::from_utf8(output.stdout).expect("utf8"),
        format!("{NO_STAGED_CHANGES}\n")
    );
}

#[test]
fn commit_outside_repository_fails() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = scribe()
        .current_dir(temp.path())
        .arg("commit")
        .output()
        .expect("scribe commit");

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("not a git working tree"), "{stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn staged_changes_without_api_key_fail_with_variable_name() {
    let repo = TestRepo::new().expect("repo");
    repo.write("a.ts", "a\n").expect("write");
    repo.stage(&["a.ts"]).expect("stage");

    let output = scribe()
        .arg("commit")
        .arg(repo.path())
        .output()
        .expect("scribe commit");

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains(KEY_ENV), "{stderr}");
}

#[test]
fn invalid_config_file_fails_before_any_work() {
    let repo = TestRepo::new().expect("repo");
    repo.write(".scribe.toml", "max_steps = 0\n").expect("write");

    let output = scribe()
        .arg("commit")
        .arg(repo.path())
        .output()
        .expect("scribe commit");

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("max_steps must be > 0"), "{stderr}");
}

#[test]
fn readme_rejects_non_boolean_overwrite() {
    let output = scribe()
        .args(["readme", ".", "--overwrite", "maybe"])
        .output()
        .expect("scribe readme");

    assert!(!output.status.success());
}
