use crate::ai::{AiProvider, Message, Prompt, ProviderOptions, ResponseFormat};
use crate::error::{OiError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// 리뷰에서 발견된 개별 이슈 (blocking 또는 warning)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReviewIssue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ReviewIssue {
    /// `file:line`, `file`, or nothing when the issue is not tied to a file.
    pub fn location(&self) -> Option<String> {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            (Some(file), None) => Some(file.clone()),
            (None, _) => None,
        }
    }
}

/// Unstaged file that looks related to the staged changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UnstagedSuggestion {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    pub blocking: Vec<ReviewIssue>,
    pub warnings: Vec<ReviewIssue>,
    #[serde(default)]
    pub unstaged_suggestions: Vec<UnstagedSuggestion>,
}

impl ReviewResult {
    pub fn has_blocking(&self) -> bool {
        !self.blocking.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn has_unstaged_suggestions(&self) -> bool {
        !self.unstaged_suggestions.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_blocking() && !self.has_warnings()
    }

    /// JSON schema handed to the model as the structured response format.
    pub fn schema() -> Result<Value> {
        Ok(serde_json::to_value(schemars::schema_for!(ReviewResult))?)
    }
}

pub const REVIEW_SYSTEM_PROMPT: &str = r#"You are a senior engineer performing a code review on staged git changes.

Focus your review on the STAGED changes only. Analyze for:

## Blocking issues (must fix before commit)
- Bugs, logical errors, or incorrect behavior
- Security vulnerabilities (injection, XSS, exposed secrets, etc.)
- Breaking changes without migration path
- Critical missing error handling
- Type errors or incorrect type usage

## Warnings (should consider)
- Performance concerns
- Code style inconsistencies with surrounding code
- Missing documentation for public APIs
- Potential edge cases not handled
- TODO/FIXME comments added without tracking

For each issue, provide:
- The file and line number if applicable
- A clear, concise description of the issue
- A suggested fix when possible

## Unstaged suggestions (VERY STRICT criteria)
ONLY report unstaged files if you can verify IN THE DIFF that:
- The staged code directly imports/references a file that appears in the unstaged diff
- The unstaged file modifies the SAME function/class that is modified in staged changes
- The unstaged file is a test file for code that is being modified in staged changes

DO NOT report unstaged files based on:
- Assumptions about what "might" be related
- Similar naming patterns
- Being in the same directory
- General topic similarity

If you cannot point to a specific line in the staged diff that references the unstaged file, do NOT include it. When in doubt, leave it out. Return an empty array for unstagedSuggestions unless you have concrete evidence.

Be concise and actionable. Only report genuine issues - do not be overly pedantic."#;

/// 리뷰 요청에 함께 전달할 부가 정보
#[derive(Debug, Clone, Default)]
pub struct ReviewOptions {
    /// Developer hint such as "this is a quick fix"
    pub context: Option<String>,
    pub unstaged_diff: Option<String>,
    pub recent_commits: Option<String>,
}

pub fn build_prompt(diff: &str, options: &ReviewOptions) -> Prompt {
    let mut system = REVIEW_SYSTEM_PROMPT.to_string();
    if let Some(context) = non_empty(&options.context) {
        system.push_str("\n\nAdditional context from the developer:\n");
        system.push_str(context);
    }

    let mut request = String::new();
    if let Some(commits) = non_empty(&options.recent_commits) {
        request.push_str(&format!("## Recent commit history (for context):\n\n{}\n\n", commits));
    }
    request.push_str(&format!("## Staged changes (to be committed):\n\n```diff\n{}\n```", diff));
    if let Some(unstaged) = non_empty(&options.unstaged_diff) {
        request.push_str(&format!(
            "\n\n## Unstaged changes (not being committed):\n\n```diff\n{}\n```",
            unstaged
        ));
    }

    Prompt::new(vec![Message::system(system), Message::user(request)])
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Review the staged diff and decode the structured verdict.
pub async fn review_changes(
    provider: &dyn AiProvider,
    diff: &str,
    options: &ReviewOptions,
) -> Result<ReviewResult> {
    let format = ResponseFormat::json("ReviewResult", ReviewResult::schema()?);
    let request = ProviderOptions::new(build_prompt(diff, options)).with_response_format(format);

    debug!(provider = provider.name(), model = ?provider.model(), "requesting review");
    let response = provider
        .generate_text(request)
        .await
        .map_err(|source| OiError::AiGeneration {
            message: "Failed to review changes".to_string(),
            source,
        })?;

    parse_review(&response.text())
}

/// JSON 응답을 ReviewResult로 변환
pub fn parse_review(text: &str) -> Result<ReviewResult> {
    serde_json::from_str(text.trim()).map_err(|e| OiError::InvalidReview(e.to_string()))
}
