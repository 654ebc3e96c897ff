use once_cell::sync::Lazy;
use regex::Regex;

/// 사전 컴파일된 정규표현식 (성능 최적화)
///
/// Whole-text fence: optional `json` tag, newline after the opening fence and
/// before the closing fence both optional. A `\r` before the closing fence is
/// only part of the fence when the opening fence ended in `\r\n`.
static CODE_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A\s*```(?:json)?[ \t]*(?:\r\n(.*?)(?:\r?\n)?|\n?(.*?)\n?)```\s*\z")
        .expect("code block regex is valid")
});

/// AI 응답 후처리 모듈
pub struct ResponseProcessor;

impl ResponseProcessor {
    /// Remove one markdown code fence wrapping the whole text.
    ///
    /// Text that is not fence-wrapped is returned unchanged, so the
    /// operation is idempotent for text without its own fences.
    ///
    /// # Examples
    /// ```
    /// use oi::ai::response_processor::ResponseProcessor;
    ///
    /// assert_eq!(ResponseProcessor::strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    /// assert_eq!(ResponseProcessor::strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    /// ```
    pub fn strip_code_fence(text: &str) -> String {
        match CODE_BLOCK_REGEX.captures(text) {
            Some(caps) => caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str())
                .to_string(),
            None => text.to_string(),
        }
    }

    /// Wraps text in a `json` fence, the shape models tend to produce.
    pub fn wrap_code_fence(text: &str) -> String {
        format!("```json\n{}\n```", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "{}",
        "{\"blocking\": [], \"warnings\": []}",
        "{\n  \"a\": 1\n}",
        "  padded  ",
        "\nleading newline",
        "trailing newline\n",
        "json",
        "multi\nline\n\ntext",
        "emoji ✅ and 한글",
        "a\r",
        "l1\r\nl2\r",
        "x\r\n",
        "\r\nleading crlf",
    ];

    #[test]
    fn test_strip_inverts_wrap() {
        for sample in SAMPLES {
            let wrapped = ResponseProcessor::wrap_code_fence(sample);
            assert_eq!(ResponseProcessor::strip_code_fence(&wrapped), *sample, "sample {:?}", sample);
        }
    }

    #[test]
    fn test_strip_is_idempotent() {
        for sample in SAMPLES {
            let once = ResponseProcessor::strip_code_fence(&ResponseProcessor::wrap_code_fence(sample));
            let twice = ResponseProcessor::strip_code_fence(&once);
            assert_eq!(once, twice, "sample {:?}", sample);
        }
    }

    #[test]
    fn test_crlf_fence() {
        let result = ResponseProcessor::strip_code_fence("```json\r\n{\"ok\":true}\r\n```\r\n");
        assert_eq!(result, "{\"ok\":true}");
    }

    #[test]
    fn test_untagged_fence() {
        let result = ResponseProcessor::strip_code_fence("```\n{\"ok\":true}\n```");
        assert_eq!(result, "{\"ok\":true}");
    }

    #[test]
    fn test_fence_with_surrounding_whitespace() {
        let result = ResponseProcessor::strip_code_fence("\n```json\n{}\n```\n");
        assert_eq!(result, "{}");
    }

    #[test]
    fn test_prose_around_fence_is_left_alone() {
        let text = "Here you go:\n```json\n{}\n```";
        assert_eq!(ResponseProcessor::strip_code_fence(text), text);
    }
}
