use crate::ai::factory::{ProviderFactory, Tier};
use crate::cli::CommitArgs;
use crate::commands::review::review_staged;
use crate::commit::generate_commit_message;
use crate::config::Config;
use crate::error::{OiError, Result};
use crate::git::Git;
use crate::ui::{create_spinner, fail_spinner, finish_spinner, ConfirmPrompt};
use colored::*;
use std::process::ExitCode;

/// `oi commit`: hook, review, message generation, then `git commit`.
pub async fn execute_commit(
    args: &CommitArgs,
    git: &Git,
    factory: &ProviderFactory,
    config: &Config,
) -> Result<ExitCode> {
    git.ensure_repo().await?;
    let diff = git.ensure_staged_changes().await?;

    // 훅을 먼저 돌려서 빠르게 실패
    if !args.no_verify {
        println!("{}", "Running pre-commit hook...".cyan());
        git.run_pre_commit_hook().await?;
    }

    if !args.skip_review {
        let review = review_staged(git, factory, config, &diff, args.context.clone()).await?;

        if review.has_blocking() {
            return Err(OiError::ReviewAborted(
                "Commit aborted due to blocking issues".to_string(),
            ));
        }

        if review.has_warnings() && !ConfirmPrompt::new().confirm_with_warnings()? {
            return Err(OiError::ReviewAborted("Commit aborted by user".to_string()));
        }
    }

    let provider = factory.provider(Tier::Commit);
    let spinner = create_spinner("Generating commit message...");
    let message = match generate_commit_message(provider.as_ref(), &diff).await {
        Ok(message) => {
            finish_spinner(&spinner, "Commit message ready");
            message
        }
        Err(e) => {
            fail_spinner(&spinner, "Commit message generation failed");
            return Err(e);
        }
    };

    println!("\n{}", "Generated commit message:".bold());
    println!("---\n{}\n---", message);

    git.commit(&message, args.no_verify).await?;
    println!("\n{}", "✅ Committed successfully!".green().bold());

    Ok(ExitCode::SUCCESS)
}
