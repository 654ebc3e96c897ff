use clap::Parser;
use colored::*;
use std::process::ExitCode;

use oi::ai::factory::ProviderFactory;
use oi::cli::{Cli, Commands};
use oi::commands::{execute_commit, execute_review};
use oi::config::Config;
use oi::error::Result;
use oi::git::Git;
use oi::logging::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load()?;

    let factory = ProviderFactory::from_env(config.clone());
    let git = Git::new();

    match &cli.command {
        Commands::Commit(args) => execute_commit(args, &git, &factory, &config).await,
        Commands::Review(args) => execute_review(args, &git, &factory, &config).await,
    }
}
