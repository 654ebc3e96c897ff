use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("oi").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("AI-assisted git operations"))
        .stdout(predicate::str::contains("commit"))
        .stdout(predicate::str::contains("review"));
}

#[test]
fn test_commit_help_lists_flags() {
    let mut cmd = Command::cargo_bin("oi").unwrap();
    cmd.args(["commit", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--no-verify"))
        .stdout(predicate::str::contains("--skip-review"))
        .stdout(predicate::str::contains("--context"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("oi").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("oi"));
}

#[test]
fn test_missing_subcommand() {
    let mut cmd = Command::cargo_bin("oi").unwrap();
    cmd.assert().failure().stderr(predicate::str::contains("Usage:"));
}

/// 설정 디렉토리를 격리한 git 저장소에서 oi를 실행하는 시나리오
#[cfg(target_os = "linux")]
mod flows {
    use super::*;
    use oi::config::Config;
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) -> String {
        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(output.status.success(), "git {:?} failed", args);
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Repository with one staged file, plus a config dir whose claude
    /// command prints `reply` as the result record.
    fn setup(reply: &str) -> (TempDir, TempDir) {
        let repo = tempdir().unwrap();
        git(repo.path(), &["init", "-q"]);
        git(repo.path(), &["config", "user.email", "dev@example.com"]);
        git(repo.path(), &["config", "user.name", "Dev"]);
        git(repo.path(), &["config", "commit.gpgsign", "false"]);
        fs::write(repo.path().join("greet.txt"), "hello\n").unwrap();
        git(repo.path(), &["add", "greet.txt"]);

        let record = serde_json::json!({"type": "result", "subtype": "success", "result": reply});
        let script = format!("cat >/dev/null; printf '%s\\n' '{}'", record);

        let config_home = tempdir().unwrap();
        let config = Config {
            claude_command: vec!["sh".into(), "-c".into(), script, "claude".into()],
            ..Config::default()
        };
        config
            .save_to(&config_home.path().join("oi").join("config.toml"))
            .unwrap();

        (repo, config_home)
    }

    fn oi(repo: &TempDir, config_home: &TempDir) -> Command {
        let mut cmd = Command::cargo_bin("oi").unwrap();
        cmd.current_dir(repo.path())
            .env("XDG_CONFIG_HOME", config_home.path())
            .env("NO_COLOR", "1")
            .env_remove("OPENAI_API_KEY")
            .env_remove("OI_LOG");
        cmd
    }

    #[test]
    fn test_outside_repository() {
        if !git_available() {
            println!("Skipping test: git not installed");
            return;
        }
        let dir = tempdir().unwrap();
        let mut cmd = Command::cargo_bin("oi").unwrap();
        cmd.current_dir(dir.path())
            .env("XDG_CONFIG_HOME", dir.path())
            .arg("review")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not inside a git repository"));
    }

    #[test]
    fn test_review_blocking_exits_one() {
        if !git_available() {
            println!("Skipping test: git not installed");
            return;
        }
        let (repo, config_home) = setup(
            r#"{"blocking":[{"file":"greet.txt","line":1,"message":"Greeting is lowercase"}],"warnings":[]}"#,
        );

        oi(&repo, &config_home)
            .arg("review")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Blocking issues"))
            .stdout(predicate::str::contains("1. greet.txt:1"));
    }

    #[test]
    fn test_review_clean() {
        if !git_available() {
            println!("Skipping test: git not installed");
            return;
        }
        let (repo, config_home) = setup(r#"{"blocking":[],"warnings":[]}"#);

        oi(&repo, &config_home)
            .arg("review")
            .assert()
            .success()
            .stdout(predicate::str::contains("No issues found in review"));
    }

    #[test]
    fn test_commit_with_generated_message() {
        if !git_available() {
            println!("Skipping test: git not installed");
            return;
        }
        let (repo, config_home) = setup("Add greeting file\n\n- greet.txt says hello");

        oi(&repo, &config_home)
            .args(["commit", "--skip-review", "--no-verify"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Committed successfully"));

        let log = git(repo.path(), &["log", "-1", "--format=%B"]);
        assert_eq!(log.trim(), "Add greeting file\n\n- greet.txt says hello");
    }

    #[test]
    fn test_commit_aborts_on_blocking_review() {
        if !git_available() {
            println!("Skipping test: git not installed");
            return;
        }
        let (repo, config_home) = setup(r#"{"blocking":[{"message":"Breaks the build"}],"warnings":[]}"#);

        oi(&repo, &config_home)
            .args(["commit", "--no-verify"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Commit aborted due to blocking issues"));

        let status = std::process::Command::new("git")
            .args(["rev-parse", "--verify", "HEAD"])
            .current_dir(repo.path())
            .output()
            .unwrap();
        assert!(!status.status.success());
    }

    #[test]
    fn test_nothing_staged() {
        if !git_available() {
            println!("Skipping test: git not installed");
            return;
        }
        let (repo, config_home) = setup("unused");
        git(repo.path(), &["rm", "--cached", "-q", "greet.txt"]);

        oi(&repo, &config_home)
            .arg("review")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No staged changes"));
    }
}
