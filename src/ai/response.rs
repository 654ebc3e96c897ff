/// Why generation stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    /// Maps an OpenAI `finish_reason` value.
    pub fn from_api(value: &str) -> Self {
        match value {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

/// Token accounting; every field is unknown for the CLI provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

impl Usage {
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// One unit of the streaming protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamPart {
    TextStart { id: String },
    TextDelta { id: String, delta: String },
    TextEnd { id: String },
    Finish { reason: FinishReason, usage: Usage },
}

impl StreamPart {
    pub fn finish_stop() -> Self {
        StreamPart::Finish {
            reason: FinishReason::Stop,
            usage: Usage::unknown(),
        }
    }

    pub fn is_finish(&self) -> bool {
        matches!(self, StreamPart::Finish { .. })
    }
}

/// Part of a non-streaming result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Text(String),
    Finish { reason: FinishReason, usage: Usage },
}

/// Outcome of `generate_text`: the full text followed by a finish part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateTextResult {
    pub parts: Vec<ResponsePart>,
}

impl GenerateTextResult {
    pub fn new(text: String, reason: FinishReason, usage: Usage) -> Self {
        Self {
            parts: vec![ResponsePart::Text(text), ResponsePart::Finish { reason, usage }],
        }
    }

    /// All text parts joined.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ResponsePart::Text(text) => Some(text.as_str()),
                ResponsePart::Finish { .. } => None,
            })
            .collect()
    }

    pub fn finish(&self) -> Option<(&FinishReason, &Usage)> {
        self.parts.iter().find_map(|part| match part {
            ResponsePart::Finish { reason, usage } => Some((reason, usage)),
            ResponsePart::Text(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_result_shape() {
        let result = GenerateTextResult::new("LGTM".to_string(), FinishReason::Stop, Usage::unknown());

        assert_eq!(result.text(), "LGTM");
        assert_eq!(result.parts.len(), 2);
        let (reason, usage) = result.finish().unwrap();
        assert_eq!(reason, &FinishReason::Stop);
        assert_eq!(usage.total_tokens, None);
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(FinishReason::from_api("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::from_api("length"), FinishReason::Length);
        assert_eq!(
            FinishReason::from_api("tool_calls"),
            FinishReason::Other("tool_calls".to_string())
        );
    }
}
