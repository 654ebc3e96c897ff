use crate::ai::claude::{ClaudeCliOptions, ClaudeCliProvider};
use crate::ai::context::AiEnvironment;
use crate::ai::openai::OpenAiProvider;
use crate::ai::process::CliCommand;
use crate::ai::AiProvider;
use crate::config::Config;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Call site a provider is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Code review: needs deeper reasoning
    Review,
    /// Commit message: cheaper and faster
    Commit,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Review => f.write_str("review"),
            Tier::Commit => f.write_str("commit"),
        }
    }
}

/// Which backend serves both tiers in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    OpenAi,
    ClaudeCli,
}

/// Resolves each tier to a provider the first time it is asked for.
///
/// With an OpenAI key both tiers use the hosted API; otherwise both use the
/// claude CLI with a tier-specific model. The backend never differs between
/// tiers within one factory.
pub struct ProviderFactory {
    environment: AiEnvironment,
    config: Config,
    review: OnceCell<Arc<dyn AiProvider>>,
    commit: OnceCell<Arc<dyn AiProvider>>,
}

impl ProviderFactory {
    pub fn new(environment: AiEnvironment, config: Config) -> Self {
        Self {
            environment,
            config,
            review: OnceCell::new(),
            commit: OnceCell::new(),
        }
    }

    /// Factory over the process-wide environment snapshot.
    pub fn from_env(config: Config) -> Self {
        Self::new(AiEnvironment::current().clone(), config)
    }

    pub fn backend(&self) -> Backend {
        if self.environment.has_openai_key() {
            Backend::OpenAi
        } else {
            Backend::ClaudeCli
        }
    }

    /// Provider for `tier`, created on first use and reused afterwards.
    pub fn provider(&self, tier: Tier) -> Arc<dyn AiProvider> {
        let cell = match tier {
            Tier::Review => &self.review,
            Tier::Commit => &self.commit,
        };
        Arc::clone(cell.get_or_init(|| self.create(tier)))
    }

    fn create(&self, tier: Tier) -> Arc<dyn AiProvider> {
        let provider: Arc<dyn AiProvider> = match (self.backend(), self.environment.openai_api_key()) {
            (Backend::OpenAi, Some(api_key)) => {
                let mut provider = OpenAiProvider::new(api_key, &self.config.openai_model);
                if let Some(base_url) = self.environment.openai_base_url() {
                    provider = provider.with_base_url(base_url);
                }
                Arc::new(provider)
            }
            _ => Arc::new(ClaudeCliProvider::new(self.claude_options(tier))),
        };

        debug!(%tier, provider = provider.name(), model = ?provider.model(), "resolved AI provider");
        provider
    }

    fn claude_options(&self, tier: Tier) -> ClaudeCliOptions {
        let model = match tier {
            Tier::Review => &self.config.review_model,
            Tier::Commit => &self.config.commit_model,
        };
        let command = CliCommand::from_argv(&self.config.claude_command)
            .unwrap_or_else(|| CliCommand::new("claude"));

        ClaudeCliOptions::with_model(model.clone()).command(command)
    }
}
