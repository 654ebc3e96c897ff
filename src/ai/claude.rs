//! `claude` CLI as a language model.
//!
//! Reuses the CLI's own authentication, so no API key is needed. The prompt is
//! flattened by [`PromptTemplate`] and written to stdin; output is read either
//! as a single JSON result (`generate_text`) or as JSON lines
//! (`stream_text`).

use crate::ai::events::{self, StreamNormalizer, MODULE};
use crate::ai::process::{CliCommand, CliProcess};
use crate::ai::prompt::{ProviderOptions, ResponseFormat};
use crate::ai::prompt_template::PromptTemplate;
use crate::ai::response::{FinishReason, GenerateTextResult, StreamPart, Usage};
use crate::ai::{panic_message, AiProvider, TextStream};
use crate::error::{AiError, AiErrorKind, AiResult};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One result record after the CLI finishes
    Json,
    /// One JSON record per line while the CLI runs
    StreamJson,
}

impl OutputFormat {
    fn as_arg(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::StreamJson => "stream-json",
        }
    }
}

/// Construction-time settings, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaudeCliOptions {
    /// Model alias or id passed as `--model` (e.g. "sonnet", "opus")
    pub model: Option<String>,
    /// Tool list passed as `--tools`; `None` disables every tool
    pub allowed_tools: Option<String>,
    pub command: CliCommand,
}

impl Default for ClaudeCliOptions {
    fn default() -> Self {
        Self {
            model: None,
            allowed_tools: None,
            command: CliCommand::new("claude"),
        }
    }
}

impl ClaudeCliOptions {
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Self::default()
        }
    }

    pub fn command(mut self, command: CliCommand) -> Self {
        self.command = command;
        self
    }
}

pub struct ClaudeCliProvider {
    options: Arc<ClaudeCliOptions>,
}

impl ClaudeCliProvider {
    pub fn new(options: ClaudeCliOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    /// Flags following the command, for the given output mode.
    pub fn build_args(&self, format: OutputFormat) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            "--output-format".to_string(),
            format.as_arg().to_string(),
        ];

        // print 모드에서 stream-json은 --verbose 없이 거부됨
        if format == OutputFormat::StreamJson {
            args.push("--verbose".to_string());
        }

        // 텍스트 생성 전용: 기본적으로 모든 도구 비활성화
        args.push("--tools".to_string());
        args.push(self.options.allowed_tools.clone().unwrap_or_default());

        if let Some(model) = &self.options.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }

        args
    }

    async fn run_single_shot(&self, options: ProviderOptions) -> AiResult<GenerateTextResult> {
        let input = PromptTemplate::encode(&options.prompt, &options.response_format);
        let args = self.build_args(OutputFormat::Json);

        let mut process = CliProcess::spawn(&self.options.command, &args, input)?;
        let output = process.collect().await?;

        if output.exit_code != Some(0) && !output.stderr.is_empty() {
            warn!(exit_code = ?output.exit_code, stderr = %output.stderr, "claude CLI failed");
        }

        let text = events::parse_single_shot(&output.stdout, output.exit_code, &options.response_format)?;
        debug!(chars = text.len(), "claude CLI returned result");

        Ok(GenerateTextResult::new(text, FinishReason::Stop, Usage::unknown()))
    }
}

fn unexpected(method: &'static str, panic: Box<dyn std::any::Any + Send>) -> AiError {
    AiError::new(
        AiErrorKind::Unexpected,
        MODULE,
        method,
        format!("Unexpected error: {}", panic_message(panic.as_ref())),
    )
}

/// State of one streaming invocation.
enum StreamState {
    Pending {
        command: CliCommand,
        args: Vec<String>,
        input: String,
        response_format: ResponseFormat,
    },
    Running {
        process: CliProcess,
        normalizer: StreamNormalizer,
        buffered: VecDeque<StreamPart>,
    },
    Done,
}

async fn next_part(mut state: StreamState) -> AiResult<Option<(StreamPart, StreamState)>> {
    loop {
        state = match state {
            StreamState::Pending {
                command,
                args,
                input,
                response_format,
            } => StreamState::Running {
                process: CliProcess::spawn(&command, &args, input)?,
                normalizer: StreamNormalizer::new(response_format),
                buffered: VecDeque::new(),
            },
            StreamState::Running {
                mut process,
                mut normalizer,
                mut buffered,
            } => {
                if let Some(part) = buffered.pop_front() {
                    return Ok(Some((
                        part,
                        StreamState::Running {
                            process,
                            normalizer,
                            buffered,
                        },
                    )));
                }

                match process.next_line().await? {
                    Some(line) => {
                        buffered.extend(normalizer.push_line(&line)?);
                        StreamState::Running {
                            process,
                            normalizer,
                            buffered,
                        }
                    }
                    None => {
                        process.shutdown().await?;
                        return Ok(Some((normalizer.finish()?, StreamState::Done)));
                    }
                }
            }
            StreamState::Done => return Ok(None),
        };
    }
}

#[async_trait]
impl AiProvider for ClaudeCliProvider {
    fn name(&self) -> &str {
        "claude-cli"
    }

    fn model(&self) -> Option<&str> {
        self.options.model.as_deref()
    }

    async fn generate_text(&self, options: ProviderOptions) -> AiResult<GenerateTextResult> {
        AssertUnwindSafe(self.run_single_shot(options))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(unexpected("generateText", panic)))
    }

    fn stream_text(&self, options: ProviderOptions) -> TextStream {
        let state = StreamState::Pending {
            command: self.options.command.clone(),
            args: self.build_args(OutputFormat::StreamJson),
            input: PromptTemplate::encode(&options.prompt, &options.response_format),
            response_format: options.response_format,
        };

        stream::try_unfold(state, |state| async move {
            AssertUnwindSafe(next_part(state))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(unexpected("streamText", panic)))
        })
        .boxed()
    }
}
