use crate::error::{OiError, Result};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// git 명령 실행기
///
/// Every command runs in `workdir` when one is set, otherwise in the current
/// directory.
#[derive(Debug, Clone, Default)]
pub struct Git {
    workdir: Option<PathBuf>,
}

impl Git {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(path: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(path.into()),
        }
    }

    fn command(&self, program: impl AsRef<std::ffi::OsStr>) -> Command {
        let mut command = Command::new(program);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }
        command
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        debug!(?args, "running git");
        self.command("git")
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| OiError::GitCommand {
                command: format!("git {}", args.join(" ")),
                message: "Failed to run git".to_string(),
                reason: e.to_string(),
            })
    }

    /// stdout of a git command that must succeed.
    async fn output(&self, args: &[&str], message: &str) -> Result<String> {
        let output = self.run(args).await?;

        if !output.status.success() {
            return Err(OiError::GitCommand {
                command: format!("git {}", args.join(" ")),
                message: message.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    pub async fn is_inside_repo(&self) -> bool {
        match self.run(&["rev-parse", "--is-inside-work-tree"]).await {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    pub async fn ensure_repo(&self) -> Result<()> {
        if self.is_inside_repo().await {
            Ok(())
        } else {
            Err(OiError::NotInGitRepo)
        }
    }

    pub async fn staged_diff(&self) -> Result<String> {
        let diff = self
            .output(&["diff", "--cached"], "Failed to get staged diff")
            .await?;
        Ok(diff.trim().to_string())
    }

    /// Staged diff, or [`OiError::NoStagedChanges`] when there is none.
    pub async fn ensure_staged_changes(&self) -> Result<String> {
        let diff = self.staged_diff().await?;
        if diff.is_empty() {
            return Err(OiError::NoStagedChanges);
        }
        Ok(diff)
    }

    pub async fn unstaged_diff(&self) -> Result<String> {
        let diff = self.output(&["diff"], "Failed to get unstaged diff").await?;
        Ok(diff.trim().to_string())
    }

    /// One line per commit, newest first. A repository without commits
    /// yields an empty string.
    pub async fn recent_commits(&self, count: usize) -> Result<String> {
        let count = count.to_string();
        let output = self.run(&["log", "--oneline", "-n", &count]).await?;
        if !output.status.success() {
            // 커밋이 없는 새 저장소
            return Ok(String::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn pre_commit_hook_path(&self) -> Result<PathBuf> {
        let path = self
            .output(&["rev-parse", "--git-path", "hooks/pre-commit"], "Failed to get git directory")
            .await?;
        let path = PathBuf::from(path.trim());

        Ok(match (&self.workdir, path.is_relative()) {
            (Some(dir), true) => dir.join(path),
            _ => path,
        })
    }

    /// Run the pre-commit hook on its own, without committing.
    pub async fn run_pre_commit_hook(&self) -> Result<()> {
        let hook = self.pre_commit_hook_path().await?;

        if !is_executable(&hook) {
            debug!(hook = %hook.display(), "no pre-commit hook");
            return Ok(());
        }

        let status = self
            .command(&hook)
            .status()
            .await
            .map_err(|e| OiError::GitCommand {
                command: hook.display().to_string(),
                message: "Failed to run pre-commit hook".to_string(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(OiError::PreCommitHook);
        }

        Ok(())
    }

    pub async fn commit(&self, message: &str, no_verify: bool) -> Result<()> {
        let mut args = vec!["commit"];
        if no_verify {
            args.push("--no-verify");
        }
        args.extend(["-m", message]);

        self.output(&args, "Failed to create commit").await?;
        Ok(())
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn init_repo(dir: &Path) -> Git {
        let git = Git::in_dir(dir);
        git.output(&["init", "-q"], "init").await.unwrap();
        git.output(&["config", "user.email", "dev@example.com"], "config").await.unwrap();
        git.output(&["config", "user.name", "Dev"], "config").await.unwrap();
        git.output(&["config", "commit.gpgsign", "false"], "config").await.unwrap();
        git
    }

    #[tokio::test]
    async fn test_not_a_repo() {
        if !git_available() {
            println!("Skipping test: git not installed");
            return;
        }
        let dir = tempdir().unwrap();
        let git = Git::in_dir(dir.path());
        assert!(matches!(git.ensure_repo().await, Err(OiError::NotInGitRepo)));
    }

    #[tokio::test]
    async fn test_staged_changes_and_commit() {
        if !git_available() {
            println!("Skipping test: git not installed");
            return;
        }
        let dir = tempdir().unwrap();
        let git = init_repo(dir.path()).await;
        git.ensure_repo().await.unwrap();

        assert!(matches!(git.ensure_staged_changes().await, Err(OiError::NoStagedChanges)));
        assert_eq!(git.recent_commits(5).await.unwrap(), "");

        fs::write(dir.path().join("a.txt"), "hello\n").unwrap();
        git.output(&["add", "a.txt"], "add").await.unwrap();

        let diff = git.ensure_staged_changes().await.unwrap();
        assert!(diff.contains("+hello"));

        git.run_pre_commit_hook().await.unwrap();
        git.commit("Add greeting", false).await.unwrap();

        let log = git.recent_commits(5).await.unwrap();
        assert!(log.ends_with("Add greeting"));

        fs::write(dir.path().join("a.txt"), "hello\nworld\n").unwrap();
        assert!(git.unstaged_diff().await.unwrap().contains("+world"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_pre_commit_hook() {
        use std::os::unix::fs::PermissionsExt;

        if !git_available() {
            println!("Skipping test: git not installed");
            return;
        }
        let dir = tempdir().unwrap();
        let git = init_repo(dir.path()).await;

        let hook = dir.path().join(".git").join("hooks").join("pre-commit");
        fs::create_dir_all(hook.parent().unwrap()).unwrap();
        fs::write(&hook, "#!/bin/sh\nexit 1\n").unwrap();
        fs::set_permissions(&hook, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(git.run_pre_commit_hook().await, Err(OiError::PreCommitHook)));
    }
}
