use std::fmt;
use thiserror::Error;

/// Failure classes reported by an AI provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiErrorKind {
    /// Process spawn, pipe I/O or HTTP transport failure
    Transport,
    /// The CLI finished with a non-zero exit status
    NonZeroExit,
    /// Output was exhausted without a usable result
    NoResult,
    /// The backend reported an explicit error
    ToolReported,
    /// Anything else that went wrong while handling the output
    Unexpected,
}

impl fmt::Display for AiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AiErrorKind::Transport => "transport",
            AiErrorKind::NonZeroExit => "non-zero exit",
            AiErrorKind::NoResult => "no result",
            AiErrorKind::ToolReported => "tool error",
            AiErrorKind::Unexpected => "unexpected",
        };
        f.write_str(label)
    }
}

/// The single error type crossing the provider boundary.
///
/// `module` names the provider (`claude-cli`, `openai`), `method` the operation
/// (`generateText`, `streamText`, `command`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{module}.{method}] {description}")]
pub struct AiError {
    pub kind: AiErrorKind,
    pub module: &'static str,
    pub method: &'static str,
    pub description: String,
}

impl AiError {
    pub fn new(
        kind: AiErrorKind,
        module: &'static str,
        method: &'static str,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            module,
            method,
            description: description.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum OiError {
    #[error("Not inside a git repository")]
    NotInGitRepo,

    #[error("No staged changes to commit")]
    NoStagedChanges,

    #[error("{message} (`{command}`): {reason}")]
    GitCommand {
        command: String,
        message: String,
        reason: String,
    },

    #[error("{message}: {source}")]
    AiGeneration {
        message: String,
        #[source]
        source: AiError,
    },

    #[error("AI returned an empty commit message")]
    EmptyCommitMessage,

    #[error("Failed to parse review result: {0}")]
    InvalidReview(String),

    #[error("{0}")]
    ReviewAborted(String),

    #[error("Pre-commit hook failed")]
    PreCommitHook,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("User cancelled")]
    UserCancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OiError>;

/// Provider-level result.
pub type AiResult<T> = std::result::Result<T, AiError>;
