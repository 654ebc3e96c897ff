//! Scoped ownership of one CLI child process.
//!
//! The prompt is written to stdin from a separate task so the caller can drain
//! stdout at the same time. Dropping a [`CliProcess`] aborts the helper tasks
//! and kills the child.

use crate::error::{AiError, AiErrorKind, AiResult};
use std::io;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const MODULE: &str = "claude-cli";
const METHOD: &str = "command";

/// Bytes of stderr kept for diagnostics.
const STDERR_TAIL_BYTES: usize = 4096;

fn transport_error(context: &str, err: io::Error) -> AiError {
    AiError::new(AiErrorKind::Transport, MODULE, METHOD, format!("{}: {}", context, err))
}

/// Program plus any arguments that precede the provider's own flags
/// (e.g. `npx @anthropic-ai/claude-code`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliCommand {
    pub program: String,
    pub leading_args: Vec<String>,
}

impl CliCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// First element is the program, the rest are leading arguments.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, rest) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            leading_args: rest.to_vec(),
        })
    }
}

/// Everything collected from a single-shot run.
#[derive(Debug, Clone)]
pub struct CollectedOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

pub struct CliProcess {
    child: Child,
    stdout: Option<BufReader<ChildStdout>>,
    writer: Option<JoinHandle<io::Result<()>>>,
    stderr: Option<JoinHandle<Vec<u8>>>,
    reaped: bool,
}

impl CliProcess {
    /// Spawn the command and start writing `input` to its stdin.
    pub fn spawn(command: &CliCommand, args: &[String], input: String) -> AiResult<Self> {
        debug!(program = %command.program, ?args, input_bytes = input.len(), "spawning CLI");

        let mut child = Command::new(&command.program)
            .args(&command.leading_args)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                let context = if e.kind() == io::ErrorKind::NotFound {
                    format!(
                        "Failed to spawn `{}` (is the Claude CLI installed? \
                         npm install -g @anthropic-ai/claude-code)",
                        command.program
                    )
                } else {
                    format!("Failed to spawn `{}`", command.program)
                };
                transport_error(&context, e)
            })?;

        let stdout = child.stdout.take().map(BufReader::new);

        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                stdin.write_all(input.as_bytes()).await?;
                stdin.shutdown().await?;
                // drop → EOF
                Ok(())
            })
        });

        let stderr = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                if let Err(e) = stderr.read_to_end(&mut buf).await {
                    debug!(error = %e, "stderr read stopped early");
                }
                if buf.len() > STDERR_TAIL_BYTES {
                    buf.drain(..buf.len() - STDERR_TAIL_BYTES);
                }
                buf
            })
        });

        Ok(Self {
            child,
            stdout: Some(stdout.ok_or_else(|| {
                AiError::new(AiErrorKind::Transport, MODULE, METHOD, "stdout was not captured")
            })?),
            writer,
            stderr,
            reaped: false,
        })
    }

    /// Next stdout line without its terminator; `None` at EOF.
    ///
    /// Invalid UTF-8 is replaced rather than treated as an error.
    pub async fn next_line(&mut self) -> AiResult<Option<String>> {
        let Some(reader) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut buf = Vec::new();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| transport_error("Failed to read CLI output", e))?;

        if read == 0 {
            self.stdout = None;
            return Ok(None);
        }

        while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
            buf.pop();
        }

        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Drain stdout, wait for the stdin write and the exit status.
    pub async fn collect(&mut self) -> AiResult<CollectedOutput> {
        let mut stdout = Vec::new();
        if let Some(mut reader) = self.stdout.take() {
            reader
                .read_to_end(&mut stdout)
                .await
                .map_err(|e| transport_error("Failed to read CLI output", e))?;
        }

        self.join_writer().await?;

        let status = self
            .child
            .wait()
            .await
            .map_err(|e| transport_error("Failed to wait for CLI", e))?;
        self.reaped = true;

        Ok(CollectedOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: self.stderr_tail().await,
            exit_code: status.code(),
        })
    }

    /// End-of-stream cleanup: surface a failed prompt write, then make sure
    /// the child is gone and reaped.
    pub async fn shutdown(&mut self) -> AiResult<()> {
        let pending = match self.writer.take() {
            Some(handle) if handle.is_finished() => Some(handle),
            Some(handle) => {
                handle.abort();
                None
            }
            None => None,
        };

        self.terminate().await;

        match pending {
            Some(handle) => Self::check_write(handle.await),
            None => Ok(()),
        }
    }

    async fn join_writer(&mut self) -> AiResult<()> {
        match self.writer.take() {
            Some(handle) => Self::check_write(handle.await),
            None => Ok(()),
        }
    }

    fn check_write(joined: Result<io::Result<()>, tokio::task::JoinError>) -> AiResult<()> {
        match joined {
            Ok(Ok(())) => Ok(()),
            // CLI가 입력을 다 읽기 전에 종료한 경우: 출력 쪽이 판단 기준
            Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
                debug!("CLI closed stdin before the prompt was fully written");
                Ok(())
            }
            Ok(Err(e)) => Err(transport_error("Failed to write prompt to CLI", e)),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(AiError::new(
                AiErrorKind::Unexpected,
                MODULE,
                METHOD,
                format!("Unexpected error: {}", e),
            )),
        }
    }

    async fn terminate(&mut self) {
        if self.reaped {
            return;
        }
        match self.child.try_wait() {
            Ok(Some(_)) => {}
            _ => {
                if let Err(e) = self.child.start_kill() {
                    debug!(error = %e, "CLI already exited");
                }
                if let Err(e) = self.child.wait().await {
                    warn!(error = %e, "failed to reap CLI process");
                }
            }
        }
        self.reaped = true;
        self.stdout = None;
    }

    async fn stderr_tail(&mut self) -> String {
        match self.stderr.take() {
            Some(handle) => handle
                .await
                .map(|buf| String::from_utf8_lossy(&buf).trim().to_string())
                .unwrap_or_default(),
            None => String::new(),
        }
    }

    /// Synchronous, idempotent release used on drop.
    fn release(&mut self) {
        if let Some(handle) = self.writer.take() {
            handle.abort();
        }
        if let Some(handle) = self.stderr.take() {
            handle.abort();
        }
        self.stdout = None;
        if !self.reaped {
            let _ = self.child.start_kill();
            self.reaped = true;
        }
    }
}

impl Drop for CliProcess {
    fn drop(&mut self) {
        self.release();
    }
}
