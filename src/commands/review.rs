use crate::ai::factory::{ProviderFactory, Tier};
use crate::cli::ReviewArgs;
use crate::config::Config;
use crate::error::Result;
use crate::git::Git;
use crate::review::{review_changes, ReviewOptions, ReviewResult};
use crate::ui::{create_spinner, fail_spinner, finish_spinner, render_review};
use std::process::ExitCode;
use tracing::debug;

/// Review `diff` with the review tier and print the verdict.
///
/// The unstaged diff and recent commit subjects are gathered concurrently and
/// passed along as context.
pub async fn review_staged(
    git: &Git,
    factory: &ProviderFactory,
    config: &Config,
    diff: &str,
    context: Option<String>,
) -> Result<ReviewResult> {
    let (unstaged, commits) = tokio::join!(git.unstaged_diff(), git.recent_commits(config.recent_commits));
    let options = ReviewOptions {
        context,
        unstaged_diff: Some(unstaged?),
        recent_commits: Some(commits?),
    };

    let provider = factory.provider(Tier::Review);
    debug!(backend = ?factory.backend(), "review provider selected");

    let spinner = create_spinner("Reviewing staged changes...");
    let review = match review_changes(provider.as_ref(), diff, &options).await {
        Ok(review) => {
            finish_spinner(&spinner, "Review complete");
            review
        }
        Err(e) => {
            fail_spinner(&spinner, "Review failed");
            return Err(e);
        }
    };

    println!("{}\n", render_review(&review));
    Ok(review)
}

/// `oi review`: exits with status 1 when blocking issues were found.
pub async fn execute_review(
    args: &ReviewArgs,
    git: &Git,
    factory: &ProviderFactory,
    config: &Config,
) -> Result<ExitCode> {
    git.ensure_repo().await?;
    let diff = git.ensure_staged_changes().await?;

    let review = review_staged(git, factory, config, &diff, args.context.clone()).await?;

    if review.has_blocking() {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}
