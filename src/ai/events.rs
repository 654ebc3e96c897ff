//! Decoding of `claude` CLI output lines.
//!
//! Every stdout line is decoded on its own. Lines that are not JSON, or JSON
//! that matches none of the known record shapes, are log noise and produce
//! nothing.

use crate::ai::prompt::ResponseFormat;
use crate::ai::response::StreamPart;
use crate::ai::response_processor::ResponseProcessor;
use crate::error::{AiError, AiErrorKind, AiResult};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

pub const MODULE: &str = "claude-cli";

/// Text id used for the single text segment a CLI invocation produces.
pub const TEXT_ID: &str = "text-0";

/// Raw shape of one output line; all fields optional.
#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    #[serde(rename = "type")]
    kind: Option<String>,
    subtype: Option<String>,
    result: Option<Value>,
    message: Option<RawMessage>,
    delta: Option<RawDelta>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMessage {
    content: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDelta {
    text: Option<Value>,
}

/// A recognized CLI record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolEvent {
    /// `{"type":"assistant","message":{"content":"..."}}`
    AssistantText(String),
    /// `{"type":"content_block_delta","delta":{"text":"..."}}`
    ContentDelta(String),
    /// `{"type":"result","subtype":"success","result":"..."}`
    ResultSuccess(String),
    /// `{"type":"result","subtype":"error",...}`
    ResultError(Option<String>),
    /// Noise or an unrecognized record
    Ignored,
}

impl ToolEvent {
    pub fn decode(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return ToolEvent::Ignored;
        }

        let record: RawRecord = match serde_json::from_str(trimmed) {
            Ok(record) => record,
            Err(e) => {
                trace!(error = %e, "skipping non-JSON line");
                return ToolEvent::Ignored;
            }
        };

        match record.kind.as_deref() {
            Some("assistant") => record
                .message
                .and_then(|message| message.content)
                .and_then(non_empty_string)
                .map_or(ToolEvent::Ignored, ToolEvent::AssistantText),
            Some("content_block_delta") => record
                .delta
                .and_then(|delta| delta.text)
                .and_then(non_empty_string)
                .map_or(ToolEvent::Ignored, ToolEvent::ContentDelta),
            Some("result") => match record.subtype.as_deref() {
                Some("success") => record
                    .result
                    .and_then(non_empty_string)
                    .map_or(ToolEvent::Ignored, ToolEvent::ResultSuccess),
                Some(subtype) if is_error_subtype(subtype) => {
                    ToolEvent::ResultError(record.result.and_then(non_empty_string))
                }
                _ => ToolEvent::Ignored,
            },
            _ => ToolEvent::Ignored,
        }
    }
}

fn non_empty_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

// error_max_turns, error_during_execution 등도 에러로 취급
fn is_error_subtype(subtype: &str) -> bool {
    subtype == "error" || subtype.starts_with("error_")
}

fn postprocess(text: String, response_format: &ResponseFormat) -> String {
    if response_format.is_json() {
        ResponseProcessor::strip_code_fence(&text)
    } else {
        text
    }
}

/// Extract the final text from single-shot (`--output-format json`) output.
pub fn parse_single_shot(
    stdout: &str,
    exit_code: Option<i32>,
    response_format: &ResponseFormat,
) -> AiResult<String> {
    const METHOD: &str = "generateText";

    match exit_code {
        Some(0) => {}
        Some(code) => {
            return Err(AiError::new(
                AiErrorKind::NonZeroExit,
                MODULE,
                METHOD,
                format!("Claude CLI exited with code {}", code),
            ))
        }
        None => {
            return Err(AiError::new(
                AiErrorKind::NonZeroExit,
                MODULE,
                METHOD,
                "Claude CLI was terminated by a signal",
            ))
        }
    }

    let mut result_text: Option<String> = None;

    for line in stdout.lines() {
        match ToolEvent::decode(line) {
            ToolEvent::ResultSuccess(text) => result_text = Some(text),
            ToolEvent::ResultError(message) => {
                return Err(AiError::new(
                    AiErrorKind::ToolReported,
                    MODULE,
                    METHOD,
                    format!(
                        "Claude CLI returned error: {}",
                        message.as_deref().unwrap_or("Unknown error")
                    ),
                ));
            }
            _ => {}
        }
    }

    let text = result_text.ok_or_else(|| {
        AiError::new(AiErrorKind::NoResult, MODULE, METHOD, "Claude CLI returned no result")
    })?;

    Ok(postprocess(text, response_format))
}

/// Per-invocation state turning CLI events into [`StreamPart`]s.
///
/// Guarantees at most one `TextStart`, emitted before the first delta, and at
/// most one `TextEnd`, emitted with the success result.
#[derive(Debug)]
pub struct StreamNormalizer {
    text_id: String,
    started: bool,
    ended: bool,
    response_format: ResponseFormat,
}

impl StreamNormalizer {
    pub fn new(response_format: ResponseFormat) -> Self {
        Self {
            text_id: TEXT_ID.to_string(),
            started: false,
            ended: false,
            response_format,
        }
    }

    fn start_once(&mut self, parts: &mut Vec<StreamPart>) {
        if !self.started {
            self.started = true;
            parts.push(StreamPart::TextStart {
                id: self.text_id.clone(),
            });
        }
    }

    fn delta(&self, delta: String) -> StreamPart {
        StreamPart::TextDelta {
            id: self.text_id.clone(),
            delta,
        }
    }

    /// Parts for one stdout line, or the tool-reported error.
    pub fn push_line(&mut self, line: &str) -> AiResult<Vec<StreamPart>> {
        let mut parts = Vec::new();

        match ToolEvent::decode(line) {
            ToolEvent::AssistantText(_) | ToolEvent::ContentDelta(_) | ToolEvent::ResultSuccess(_)
                if self.ended =>
            {
                debug!("ignoring text after the final result");
            }
            ToolEvent::AssistantText(text) | ToolEvent::ContentDelta(text) => {
                self.start_once(&mut parts);
                parts.push(self.delta(text));
            }
            ToolEvent::ResultSuccess(text) => {
                self.start_once(&mut parts);
                let text = postprocess(text, &self.response_format);
                parts.push(self.delta(text));
                parts.push(StreamPart::TextEnd {
                    id: self.text_id.clone(),
                });
                self.ended = true;
            }
            ToolEvent::ResultError(message) => {
                return Err(AiError::new(
                    AiErrorKind::ToolReported,
                    MODULE,
                    "streamText",
                    format!("Claude CLI error: {}", message.as_deref().unwrap_or("Unknown")),
                ));
            }
            ToolEvent::Ignored => {
                debug!(line = %line.trim(), "ignoring unrecognized CLI output");
            }
        }

        Ok(parts)
    }

    /// Terminal part once the output is exhausted; a stream that never
    /// delivered a success result fails instead.
    pub fn finish(&self) -> AiResult<StreamPart> {
        if self.ended {
            Ok(StreamPart::finish_stop())
        } else {
            Err(AiError::new(
                AiErrorKind::NoResult,
                MODULE,
                "streamText",
                "Claude CLI returned no result",
            ))
        }
    }
}
