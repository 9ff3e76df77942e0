//! CLI argument definitions
//!
//! Global flags map one-to-one onto [`CliArgs`] overrides.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::CliArgs;

/// codedrop - turn model responses into files on disk
#[derive(Parser, Debug)]
#[command(name = "codedrop")]
#[command(about = "Ask a local model for code and write the files it returns")]
#[command(long_about = r#"
codedrop sends a request to a local Ollama model, recovers every file the
model wrote in its reply, writes them under the output directory, and checks
each write by reading it back.

EXAMPLES:
  # Interactive session in ./site
  codedrop -o site

  # One request, then exit
  codedrop run "create a landing page with a separate stylesheet"

  # Materialize a saved response without a backend
  codedrop replay response.md --request "add a contact page"

  # List installed models
  codedrop models

CONFIGURATION:
  Precedence: CLI flags > config file > defaults
  The config file is found by searching upward from the current directory
  for .codedrop/config.toml. Use --config to name one explicitly.
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory generated files are written to
    #[arg(short = 'o', long = "output", global = true, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Model name
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Ollama host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Ollama port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Show parser decisions and the raw response
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Permit symlinks and hardlinks inside the output directory
    #[arg(long, global = true)]
    pub allow_links: bool,

    /// Do not send existing project files with the request
    #[arg(long, global = true)]
    pub no_context: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Interactive session (default)
    Chat,

    /// Send one request and exit
    Run {
        /// Request text; words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        request: Vec<String>,

        /// Print the outcome as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Materialize a saved response offline
    Replay {
        /// Response text file, or `-` for stdin
        response_file: PathBuf,

        /// Request the response answered; used by the completeness check
        #[arg(long)]
        request: Option<String>,

        /// Print the outcome as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// List models installed on the backend
    Models,
}

impl Cli {
    /// Overrides for config discovery.
    #[must_use]
    pub fn to_cli_args(&self) -> CliArgs {
        CliArgs {
            config_path: self.config.clone(),
            output_dir: self.output.clone(),
            model: self.model.clone(),
            host: self.host.clone(),
            port: self.port,
            timeout_secs: self.timeout,
            verbose: self.verbose,
            allow_links: self.allow_links,
            no_context: self.no_context,
        }
    }

    /// Subcommand, `chat` when none was given.
    #[must_use]
    pub fn resolved_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Chat)
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
    fn test_no_subcommand_means_chat() {
        let cli = Cli::parse_from(["codedrop"]);
        assert_eq!(cli.resolved_command(), Commands::Chat);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "codedrop", "run", "make", "a", "page", "-o", "site", "--port", "9999", "-v",
        ]);
        let args = cli.to_cli_args();
        assert_eq!(args.output_dir, Some(PathBuf::from("site")));
        assert_eq!(args.port, Some(9999));
        assert!(args.verbose);
        match cli.resolved_command() {
            Commands::Run { request, json } => {
                assert_eq!(request.join(" "), "make a page");
                assert!(!json);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_replay_arguments() {
        let cli = Cli::parse_from([
            "codedrop", "replay", "saved.md", "--request", "add a page", "--no-context",
        ]);
        assert!(cli.to_cli_args().no_context);
        assert_eq!(
            cli.resolved_command(),
            Commands::Replay {
                response_file: PathBuf::from("saved.md"),
                request: Some("add a page".to_string()),
                json: false,
            }
        );
    }

    #[test]
    fn test_run_requires_request() {
        assert!(Cli::try_parse_from(["codedrop", "run"]).is_err());
    }
}
