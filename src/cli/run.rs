//! CLI entry point and dispatch
//!
//! `run()` parses arguments, installs tracing, discovers config, creates
//! the tokio runtime, and dispatches. It prints every error itself.

use anyhow::Result;
use clap::Parser;

use super::args::{Cli, Commands};
use super::{commands, repl};
use crate::{CodedropError, Config, ExitCode};

/// Main CLI execution function.
///
/// Returns `Err(code)` for any non-zero exit; main.rs only calls
/// `std::process::exit`.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = codedrop_utils::logging::init_tracing(cli.verbose) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    let config = match Config::discover(&cli.to_cli_args()) {
        Ok(config) => config,
        Err(err) => {
            let err = CodedropError::from(err);
            eprintln!("{}", err.display_for_user());
            return Err(err.to_exit_code());
        }
    };
    tracing::debug!(
        config_path = ?config.config_path,
        output_dir = %config.defaults.output_dir.display(),
        "configuration loaded"
    );

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create async runtime: {e}");
            return Err(ExitCode::FAILURE);
        }
    };

    let result = rt.block_on(dispatch(cli.resolved_command(), &config));

    match result {
        Ok(code) if code == ExitCode::SUCCESS => Ok(()),
        Ok(code) => Err(code),
        Err(error) => Err(report(&error)),
    }
}

async fn dispatch(command: Commands, config: &Config) -> Result<ExitCode> {
    match command {
        Commands::Chat => repl::execute_chat(config).await,
        Commands::Run { request, json } => {
            commands::execute_run(config, &request.join(" "), json).await
        }
        Commands::Replay {
            response_file,
            request,
            json,
        } => commands::execute_replay(config, &response_file, request.as_deref(), json).await,
        Commands::Models => commands::execute_models(config).await,
    }
}

/// Print an error and pick its exit code.
fn report(error: &anyhow::Error) -> ExitCode {
    if let Some(err) = error.downcast_ref::<CodedropError>() {
        eprintln!("{}", err.display_for_user());
        return err.to_exit_code();
    }
    eprintln!("Error: {error:#}");
    eprintln!("\n  Run with --verbose for more detailed output.");
    ExitCode::FAILURE
}
