use crate::ai::{AiProvider, Message, Prompt, ProviderOptions};
use crate::error::{OiError, Result};
use tracing::debug;

pub const COMMIT_SYSTEM_PROMPT: &str = "You are a senior engineer writing a git commit message for the staged diff below. Produce text in this exact format: A single short first line summary (<=72 chars), then a blank line, then a concise list of semantic changes (bullets or short paragraphs). Do not add quotes, prefixes, git trailers, or commentary. Only describe changes present in the staged diff.";

pub fn build_prompt(diff: &str) -> Prompt {
    Prompt::new(vec![Message::system(COMMIT_SYSTEM_PROMPT), Message::user(diff)])
}

/// 스테이징된 diff로 커밋 메시지 생성
///
/// The reply is trimmed; a blank reply is [`OiError::EmptyCommitMessage`].
pub async fn generate_commit_message(provider: &dyn AiProvider, diff: &str) -> Result<String> {
    debug!(provider = provider.name(), model = ?provider.model(), "generating commit message");

    let response = provider
        .generate_text(ProviderOptions::new(build_prompt(diff)))
        .await
        .map_err(|source| OiError::AiGeneration {
            message: "Failed to generate commit message".to_string(),
            source,
        })?;

    let message = response.text().trim().to_string();
    if message.is_empty() {
        return Err(OiError::EmptyCommitMessage);
    }

    Ok(message)
}
