//! OpenAI chat completions provider.

use crate::ai::prompt::{Prompt, ProviderOptions, ResponseFormat};
use crate::ai::prompt_template::PromptTemplate;
use crate::ai::response::{FinishReason, GenerateTextResult, StreamPart, Usage};
use crate::ai::{AiProvider, TextStream};
use crate::error::{AiError, AiErrorKind, AiResult};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::VecDeque;
use tracing::debug;

const MODULE: &str = "openai";

/// OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1";

const TEXT_ID: &str = "text-0";

#[derive(Debug, Serialize, PartialEq)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

impl From<ApiUsage> for Usage {
    fn from(usage: ApiUsage) -> Self {
        Usage {
            input_tokens: Some(usage.prompt_tokens),
            output_tokens: Some(usage.completion_tokens),
            total_tokens: Some(usage.total_tokens),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

fn api_error(method: &'static str, status: reqwest::StatusCode, body: &str) -> AiError {
    let description = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => format!(
            "OpenAI API error ({}): {} - {}",
            status,
            parsed.error.error_type.as_deref().unwrap_or("error"),
            parsed.error.message
        ),
        Err(_) => format!("OpenAI API error ({}): {}", status, body),
    };
    AiError::new(AiErrorKind::ToolReported, MODULE, method, description)
}

fn transport_error(method: &'static str, err: reqwest::Error) -> AiError {
    AiError::new(
        AiErrorKind::Transport,
        MODULE,
        method,
        format!("OpenAI API request failed: {}", err),
    )
}

/// Convert the prompt to chat messages. Json output adds the schema as a
/// trailing system message.
fn convert_messages(prompt: &Prompt, response_format: &ResponseFormat) -> Vec<ChatMessage> {
    let mut messages: Vec<ChatMessage> = prompt
        .messages()
        .iter()
        .map(|message| ChatMessage {
            role: message.role(),
            content: message.text(),
        })
        .filter(|message| !message.content.is_empty())
        .collect();

    if let ResponseFormat::Json { schema, .. } = response_format {
        messages.push(ChatMessage {
            role: "system",
            content: PromptTemplate::json_instructions(schema),
        });
    }

    messages
}

/// Splits a byte stream into SSE `data:` payloads.
#[derive(Debug, Default)]
struct SseBuffer {
    pending: Vec<u8>,
}

impl SseBuffer {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(data) = line.trim_end().strip_prefix("data:") {
                payloads.push(data.trim_start().to_string());
            }
        }
        payloads
    }

    fn flush(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let line = String::from_utf8_lossy(&rest);
        line.trim_end()
            .strip_prefix("data:")
            .map(|data| data.trim_start().to_string())
    }
}

/// Turns chat completion chunks into protocol parts.
#[derive(Debug, Default)]
struct ChunkNormalizer {
    started: bool,
    finished: bool,
    finish_reason: Option<String>,
    usage: Usage,
}

impl ChunkNormalizer {
    fn push_payload(&mut self, payload: &str) -> AiResult<Vec<StreamPart>> {
        if payload == "[DONE]" {
            return Ok(self.finish());
        }

        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(payload) {
            return Err(AiError::new(
                AiErrorKind::ToolReported,
                MODULE,
                "streamText",
                format!("OpenAI API error: {}", error.error.message),
            ));
        }

        let chunk: ChatChunk = match serde_json::from_str(payload) {
            Ok(chunk) => chunk,
            Err(e) => {
                debug!(payload, error = %e, "ignoring unrecognized SSE payload");
                return Ok(Vec::new());
            }
        };

        if let Some(usage) = chunk.usage {
            self.usage = usage.into();
        }

        let mut parts = Vec::new();
        for choice in chunk.choices {
            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                if !self.started {
                    self.started = true;
                    parts.push(StreamPart::TextStart { id: TEXT_ID.to_string() });
                }
                parts.push(StreamPart::TextDelta {
                    id: TEXT_ID.to_string(),
                    delta: content,
                });
            }
            if choice.finish_reason.is_some() {
                self.finish_reason = choice.finish_reason;
            }
        }
        Ok(parts)
    }

    /// Closing parts; empty when already finished.
    fn finish(&mut self) -> Vec<StreamPart> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;

        let mut parts = Vec::new();
        if self.started {
            parts.push(StreamPart::TextEnd { id: TEXT_ID.to_string() });
        }
        parts.push(StreamPart::Finish {
            reason: self
                .finish_reason
                .as_deref()
                .map_or(FinishReason::Stop, FinishReason::from_api),
            usage: self.usage,
        });
        parts
    }
}

/// OpenAI chat completions provider.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    /// Set a custom base URL (e.g. an OpenAI-compatible proxy).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn request(&self, options: &ProviderOptions, stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: convert_messages(&options.prompt, &options.response_format),
            response_format: options
                .response_format
                .is_json()
                .then(|| json!({ "type": "json_object" })),
            stream,
            stream_options: stream.then(|| json!({ "include_usage": true })),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

async fn post_chat(
    client: &Client,
    url: &str,
    api_key: &str,
    method: &'static str,
    request: &ChatRequest,
) -> AiResult<reqwest::Response> {
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(request)
        .send()
        .await
        .map_err(|e| transport_error(method, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(api_error(method, status, &body));
    }
    Ok(response)
}

enum StreamState {
    Pending {
        client: Client,
        url: String,
        api_key: String,
        request: ChatRequest,
    },
    Running {
        body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
        sse: SseBuffer,
        normalizer: ChunkNormalizer,
        buffered: VecDeque<StreamPart>,
    },
    Done,
}

async fn next_part(mut state: StreamState) -> AiResult<Option<(StreamPart, StreamState)>> {
    const METHOD: &str = "streamText";

    loop {
        state = match state {
            StreamState::Pending {
                client,
                url,
                api_key,
                request,
            } => {
                let response = post_chat(&client, &url, &api_key, METHOD, &request).await?;

                StreamState::Running {
                    body: response.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec())).boxed(),
                    sse: SseBuffer::default(),
                    normalizer: ChunkNormalizer::default(),
                    buffered: VecDeque::new(),
                }
            }
            StreamState::Running {
                mut body,
                mut sse,
                mut normalizer,
                mut buffered,
            } => {
                if let Some(part) = buffered.pop_front() {
                    let next = if part.is_finish() {
                        StreamState::Done
                    } else {
                        StreamState::Running {
                            body,
                            sse,
                            normalizer,
                            buffered,
                        }
                    };
                    return Ok(Some((part, next)));
                }

                match body.next().await {
                    Some(chunk) => {
                        let chunk = chunk.map_err(|e| transport_error(METHOD, e))?;
                        for payload in sse.push(&chunk) {
                            buffered.extend(normalizer.push_payload(&payload)?);
                        }
                    }
                    None => {
                        if let Some(payload) = sse.flush() {
                            buffered.extend(normalizer.push_payload(&payload)?);
                        }
                        buffered.extend(normalizer.finish());
                    }
                }

                StreamState::Running {
                    body,
                    sse,
                    normalizer,
                    buffered,
                }
            }
            StreamState::Done => return Ok(None),
        };
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }

    async fn generate_text(&self, options: ProviderOptions) -> AiResult<GenerateTextResult> {
        const METHOD: &str = "generateText";

        let request = self.request(&options, false);
        let response = post_chat(&self.client, &self.endpoint(), &self.api_key, METHOD, &request).await?;
        let body = response.text().await.map_err(|e| transport_error(METHOD, e))?;

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            AiError::new(
                AiErrorKind::Unexpected,
                MODULE,
                METHOD,
                format!("Failed to parse response: {}", e),
            )
        })?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            AiError::new(AiErrorKind::NoResult, MODULE, METHOD, "OpenAI returned no choices")
        })?;

        Ok(GenerateTextResult::new(
            choice.message.content.unwrap_or_default(),
            choice
                .finish_reason
                .as_deref()
                .map_or(FinishReason::Stop, FinishReason::from_api),
            parsed.usage.map(Usage::from).unwrap_or_default(),
        ))
    }

    fn stream_text(&self, options: ProviderOptions) -> TextStream {
        let state = StreamState::Pending {
            client: self.client.clone(),
            url: self.endpoint(),
            api_key: self.api_key.clone(),
            request: self.request(&options, true),
        };

        stream::try_unfold(state, next_part).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompt::Message;

    #[test]
    fn test_provider_identity() {
        let provider = OpenAiProvider::new("sk-test", "gpt-4o").with_base_url("http://localhost:8080/v1/");
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), Some("gpt-4o"));
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_message_conversion() {
        let prompt = Prompt::new(vec![
            Message::system("You are a reviewer"),
            Message::user("diff body"),
            Message::assistant("Looks fine"),
        ]);

        let messages = convert_messages(&prompt, &ResponseFormat::Text);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "diff body");
        assert_eq!(messages[2].role, "assistant");
    }

    #[test]
    fn test_json_request_shape() {
        let provider = OpenAiProvider::new("sk-test", "gpt-4o");
        let options = ProviderOptions::new(Prompt::new(vec![Message::user("review")]))
            .with_response_format(ResponseFormat::json("ReviewResult", json!({"type": "object"})));

        let body = serde_json::to_value(provider.request(&options, true)).unwrap();
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["stream"], true);
        assert_eq!(body["stream_options"]["include_usage"], true);
        assert_eq!(body["messages"][1]["role"], "system");

        let body = serde_json::to_value(provider.request(&ProviderOptions::default(), false)).unwrap();
        assert!(body.get("stream").is_none());
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_sse_buffer_handles_split_chunks() {
        let mut sse = SseBuffer::default();
        assert!(sse.push(b"data: {\"a\"").is_empty());
        assert_eq!(sse.push(b":1}\n\nevent: ping\ndata: [DONE]\n"), vec!["{\"a\":1}", "[DONE]"]);
        assert!(sse.flush().is_none());
    }

    #[test]
    fn test_chunk_normalizer_sequence() {
        let mut normalizer = ChunkNormalizer::default();
        let mut parts = Vec::new();
        for payload in [
            r#"{"choices":[{"delta":{"role":"assistant","content":""}}]}"#,
            r#"{"choices":[{"delta":{"content":"Hel"}}]}"#,
            r#"{"choices":[{"delta":{"content":"lo"},"finish_reason":"stop"}]}"#,
            r#"{"choices":[],"usage":{"prompt_tokens":3,"completion_tokens":2,"total_tokens":5}}"#,
            "[DONE]",
        ] {
            parts.extend(normalizer.push_payload(payload).unwrap());
        }
        parts.extend(normalizer.finish());

        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0], StreamPart::TextStart { id: TEXT_ID.to_string() });
        assert_eq!(parts[3], StreamPart::TextEnd { id: TEXT_ID.to_string() });
        assert_eq!(
            parts[4],
            StreamPart::Finish {
                reason: FinishReason::Stop,
                usage: Usage {
                    input_tokens: Some(3),
                    output_tokens: Some(2),
                    total_tokens: Some(5),
                },
            }
        );
    }

    #[test]
    fn test_chunk_normalizer_error_payload() {
        let mut normalizer = ChunkNormalizer::default();
        let err = normalizer
            .push_payload(r#"{"error":{"message":"overloaded","type":"server_error"}}"#)
            .unwrap_err();
        assert_eq!(err.kind, AiErrorKind::ToolReported);
        assert!(err.description.contains("overloaded"));
    }

    #[test]
    fn test_api_error_description() {
        let err = api_error(
            "generateText",
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Incorrect API key","type":"invalid_request_error"}}"#,
        );
        assert_eq!(err.kind, AiErrorKind::ToolReported);
        assert!(err.description.contains("Incorrect API key"));
        assert!(err.description.contains("401"));
    }
}
