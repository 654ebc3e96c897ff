use crate::ai::prompt::{ContentPart, Message, Prompt, ResponseFormat};
use serde_json::Value;

/// CLI provider용 프롬프트 인코더
///
/// 구조화된 [`Prompt`]를 CLI가 stdin으로 받는 하나의 텍스트로 평탄화합니다.
pub struct PromptTemplate;

impl PromptTemplate {
    /// Flatten a prompt into paragraphs separated by a blank line.
    ///
    /// # Examples
    /// ```
    /// use oi::ai::prompt::{Message, Prompt, ResponseFormat};
    /// use oi::ai::prompt_template::PromptTemplate;
    ///
    /// let prompt = Prompt::new(vec![Message::system("Be brief"), Message::user("hello")]);
    /// let text = PromptTemplate::encode(&prompt, &ResponseFormat::Text);
    /// assert_eq!(text, "[System]: Be brief\n\nhello");
    /// ```
    pub fn encode(prompt: &Prompt, response_format: &ResponseFormat) -> String {
        let mut paragraphs: Vec<String> = Vec::new();

        for message in prompt.messages() {
            match message {
                Message::System(content) => paragraphs.push(format!("[System]: {}", content)),
                Message::User(parts) => {
                    paragraphs.extend(parts.iter().filter_map(ContentPart::as_text).map(str::to_string));
                }
                Message::Assistant(parts) => {
                    paragraphs.extend(
                        parts
                            .iter()
                            .filter_map(ContentPart::as_text)
                            .map(|text| format!("[Assistant]: {}", text)),
                    );
                }
            }
        }

        if let ResponseFormat::Json { schema, .. } = response_format {
            paragraphs.push(format!("[System]: {}", Self::json_instructions(schema)));
        }

        paragraphs.join("\n\n")
    }

    /// Raw-JSON instructions followed by the pretty-printed schema.
    pub fn json_instructions(schema: &Value) -> String {
        let rendered = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
        format!(
            "CRITICAL: Your response must be ONLY raw JSON. \
             Do NOT use markdown code blocks (```). \
             Do NOT add any explanation before or after. \
             Start your response with {{ and end with }}. \
             The JSON must conform to this schema:\n{}",
            rendered
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_roles_are_labeled() {
        let prompt = Prompt::new(vec![
            Message::system("You are a reviewer"),
            Message::user("diff body"),
            Message::assistant("Looks fine"),
            Message::user("and this?"),
        ]);

        let text = PromptTemplate::encode(&prompt, &ResponseFormat::Text);
        assert_eq!(
            text,
            "[System]: You are a reviewer\n\ndiff body\n\n[Assistant]: Looks fine\n\nand this?"
        );
    }

    #[test]
    fn test_each_text_part_is_a_paragraph() {
        let prompt = Prompt::new(vec![Message::User(vec![
            ContentPart::Text("one".to_string()),
            ContentPart::ToolCall {
                id: "t1".to_string(),
                name: "read".to_string(),
                input: json!({}),
            },
            ContentPart::Text("two".to_string()),
        ])]);

        let text = PromptTemplate::encode(&prompt, &ResponseFormat::Text);
        assert_eq!(text, "one\n\ntwo");
    }

    #[test]
    fn test_json_format_appends_schema_paragraph() {
        let schema = json!({"type": "object", "properties": {"ok": {"type": "boolean"}}});
        let prompt = Prompt::new(vec![Message::user("check")]);

        let text = PromptTemplate::encode(&prompt, &ResponseFormat::json("Check", schema));
        let paragraphs: Vec<&str> = text.splitn(2, "\n\n").collect();

        assert_eq!(paragraphs[0], "check");
        assert!(paragraphs[1].starts_with("[System]: CRITICAL: Your response must be ONLY raw JSON."));
        assert!(paragraphs[1].contains("Start your response with { and end with }."));
        assert!(paragraphs[1].contains("\"ok\": {"));
    }

    #[test]
    fn test_empty_prompt() {
        let text = PromptTemplate::encode(&Prompt::default(), &ResponseFormat::Text);
        assert!(text.is_empty());
    }
}
