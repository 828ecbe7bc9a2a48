//! Command-line tests for the fq binary
//!
//! Every test points logging at a temp dir and the API at a closed port, so
//! nothing here touches the user's data or the network.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn config(&self, body: &str) -> std::path::PathBuf {
        let path = self.dir.path().join("flashquest.yml");
        let mut file = std::fs::File::create(&path).expect("Failed to create config");
        file.write_all(body.as_bytes()).expect("Failed to write config");
        path
    }

    fn offline_config(&self) -> std::path::PathBuf {
        self.config(
            "api:\n  base-url: http://127.0.0.1:9\n  timeout-ms: 2000\nauth:\n  password-env: FQ_TEST_PASSWORD_UNSET\n",
        )
    }

    fn fq(&self) -> Command {
        let mut cmd = Command::cargo_bin("fq").expect("fq binary");
        cmd.current_dir(self.dir.path())
            .env("XDG_DATA_HOME", self.dir.path())
            .env("HOME", self.dir.path())
            .env_remove("FQ_SESSION")
            .env_remove("FQ_PASSWORD");
        cmd
    }
}

#[test]
fn test_help_lists_study_commands() {
    let sandbox = Sandbox::new();
    sandbox
        .fq()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("study-all"))
        .stdout(predicate::str::contains("decks"));
}

#[test]
fn test_version_flag() {
    let sandbox = Sandbox::new();
    sandbox.fq().arg("--version").assert().success().stdout(predicate::str::starts_with("fq "));
}

#[test]
fn test_decks_fails_when_server_unreachable() {
    let sandbox = Sandbox::new();
    let config = sandbox.offline_config();
    sandbox.fq().arg("--config").arg(&config).arg("decks").assert().failure();
}

#[test]
fn test_study_fails_before_entering_tui_when_server_unreachable() {
    let sandbox = Sandbox::new();
    let config = sandbox.offline_config();
    sandbox
        .fq()
        .arg("--config")
        .arg(&config)
        .args(["study", "d1"])
        .assert()
        .failure();
}

#[test]
fn test_upload_rejects_missing_file() {
    let sandbox = Sandbox::new();
    let config = sandbox.offline_config();
    sandbox
        .fq()
        .arg("--config")
        .arg(&config)
        .args(["upload", "d1", "no-such-syllabus.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a file"));
}

#[test]
fn test_login_requires_email() {
    let sandbox = Sandbox::new();
    let config = sandbox.offline_config();
    sandbox
        .fq()
        .arg("--config")
        .arg(&config)
        .args(["login", "--password", "secret"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No --email given"));
}

#[test]
fn test_invalid_config_is_reported() {
    let sandbox = Sandbox::new();
    let config = sandbox.config("api: [not, a, map]\n");
    sandbox
        .fq()
        .arg("--config")
        .arg(&config)
        .arg("decks")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_log_file_written_under_data_dir() {
    let sandbox = Sandbox::new();
    let config = sandbox.offline_config();
    sandbox
        .fq()
        .arg("--config")
        .arg(&config)
        .args(["upload", "d1", "missing.txt"])
        .assert()
        .failure();
    assert!(sandbox.dir.path().join("flashquest/logs/flashquest.log").exists());
}
