use serde_json::Value;

/// One typed piece of user or assistant content.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    /// Binary attachment (only the hosted API could use it)
    File { media_type: String, data: Vec<u8> },
    ToolCall { id: String, name: String, input: Value },
}

impl ContentPart {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    System(String),
    User(Vec<ContentPart>),
    Assistant(Vec<ContentPart>),
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System(content.into())
    }

    pub fn user(text: impl Into<String>) -> Self {
        Message::User(vec![ContentPart::Text(text.into())])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Message::Assistant(vec![ContentPart::Text(text.into())])
    }

    pub fn role(&self) -> &'static str {
        match self {
            Message::System(_) => "system",
            Message::User(_) => "user",
            Message::Assistant(_) => "assistant",
        }
    }

    /// Concatenated text parts, non-text parts skipped.
    pub fn text(&self) -> String {
        match self {
            Message::System(content) => content.clone(),
            Message::User(parts) | Message::Assistant(parts) => parts
                .iter()
                .filter_map(ContentPart::as_text)
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

/// Ordered conversation handed to a provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prompt {
    messages: Vec<Message>,
}

impl Prompt {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Builder-style append; the prompt is not mutated after it is handed off.
    pub fn with(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// Structured output; `schema` is a JSON Schema document
    Json { name: String, schema: Value },
}

impl ResponseFormat {
    pub fn json(name: impl Into<String>, schema: Value) -> Self {
        ResponseFormat::Json {
            name: name.into(),
            schema,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, ResponseFormat::Json { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderOptions {
    pub prompt: Prompt,
    pub response_format: ResponseFormat,
}

impl ProviderOptions {
    pub fn new(prompt: Prompt) -> Self {
        Self {
            prompt,
            response_format: ResponseFormat::Text,
        }
    }

    pub fn with_response_format(mut self, response_format: ResponseFormat) -> Self {
        self.response_format = response_format;
        self
    }
}
