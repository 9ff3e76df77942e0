//! Command-line interface for codedrop
//!
//! ## Module Structure
//!
//! - `args`: clap definitions
//! - `run`: entry point and dispatch
//! - `commands`: one-shot commands and shared helpers
//! - `repl`: the interactive session

pub mod args;
mod commands;
mod repl;
mod run;

pub use args::{Cli, Commands};
pub use repl::ReplCommand;
pub use run::run;
