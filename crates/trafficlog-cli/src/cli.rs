//! CLI argument parsing

use crate::commands::{self, CheckArgs, RenderArgs, ResolveArgs};
use clap::{Parser, Subcommand};

/// trafficlog - read and check HTTP traffic logs
#[derive(Parser, Debug)]
#[command(name = "trafficlog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Re-render a JSON lines traffic log in readable form
    Render(RenderArgs),

    /// Validate a rule list and print what it resolves to
    Check(CheckArgs),

    /// Show the decision a rule list makes for one request
    Resolve(ResolveArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Render(args) => commands::render(args).await,
            Commands::Check(args) => commands::check(args).await,
            Commands::Resolve(args) => commands::resolve(args).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render_flags() {
        let cli = Cli::try_parse_from(["trafficlog", "render", "log.jsonl", "--color", "--follow"])
            .unwrap();
        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.file.as_deref(), Some(std::path::Path::new("log.jsonl")));
                assert!(args.color);
                assert!(args.follow);
                assert!(!args.pretty);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_follow_requires_file() {
        assert!(Cli::try_parse_from(["trafficlog", "render", "--follow"]).is_err());
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from(["trafficlog", "resolve", "[\"post\"]", "post", "201"]).unwrap();
        match cli.command {
            Commands::Resolve(args) => {
                assert_eq!(args.method, "post");
                assert_eq!(args.status, Some(201));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
