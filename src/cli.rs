use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "oi")]
#[command(version)]
#[command(about = "AI-assisted git operations", long_about = None)]
pub struct Cli {
    /// 디버그 로그 출력 (OI_LOG가 설정되어 있으면 그 값을 우선)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate AI commit message and commit staged changes
    Commit(CommitArgs),

    /// Review staged changes for issues
    Review(ReviewArgs),
}

#[derive(Args, Debug, Default)]
pub struct CommitArgs {
    /// Skip commit hooks with --no-verify
    #[arg(long)]
    pub no_verify: bool,

    /// Skip the AI code review step
    #[arg(long)]
    pub skip_review: bool,

    /// Additional context to guide the review (e.g. "this is a quick fix" or "focus on security")
    #[arg(long)]
    pub context: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct ReviewArgs {
    /// Additional context to guide the review (e.g. "this is a quick fix" or "focus on security")
    #[arg(long)]
    pub context: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_flags() {
        let cli = Cli::try_parse_from(["oi", "commit", "--no-verify", "--context", "quick fix"]).unwrap();
        match cli.command {
            Commands::Commit(args) => {
                assert!(args.no_verify);
                assert!(!args.skip_review);
                assert_eq!(args.context.as_deref(), Some("quick fix"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_debug_after_subcommand() {
        let cli = Cli::try_parse_from(["oi", "review", "--debug"]).unwrap();
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::Review(_)));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["oi"]).is_err());
        assert!(Cli::try_parse_from(["oi", "review", "--skip-review"]).is_err());
    }
}
