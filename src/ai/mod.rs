pub mod claude;
pub mod context;
pub mod events;
pub mod factory;
pub mod openai;
pub mod process;
pub mod prompt;
pub mod prompt_template;
pub mod response;
pub mod response_processor;

use crate::error::AiResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

pub use prompt::{ContentPart, Message, Prompt, ProviderOptions, ResponseFormat};
pub use response::{FinishReason, GenerateTextResult, ResponsePart, StreamPart, Usage};

/// Lazy stream of protocol parts; ends after `Finish` or after the first error.
pub type TextStream = BoxStream<'static, AiResult<StreamPart>>;

/// Language model capability shared by the hosted API and the CLI adapter
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider name (e.g., "openai", "claude-cli")
    fn name(&self) -> &str;

    /// Underlying model identifier, when one is pinned
    fn model(&self) -> Option<&str>;

    /// Generate the complete text in one call
    async fn generate_text(&self, options: ProviderOptions) -> AiResult<GenerateTextResult>;

    /// Stream the text as start/delta/end/finish parts.
    ///
    /// Nothing happens until the stream is first polled; dropping the stream
    /// cancels the underlying request.
    fn stream_text(&self, options: ProviderOptions) -> TextStream;
}

/// Drive a stream to completion, calling `on_delta` for each text delta.
///
/// Returns the concatenated deltas once the finish part arrives.
pub async fn collect_stream<F>(mut stream: TextStream, mut on_delta: F) -> AiResult<String>
where
    F: FnMut(&str),
{
    let mut text = String::new();
    while let Some(part) = stream.next().await {
        if let StreamPart::TextDelta { delta, .. } = part? {
            on_delta(&delta);
            text.push_str(&delta);
        }
    }
    Ok(text)
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
