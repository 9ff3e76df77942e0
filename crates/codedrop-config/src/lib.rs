//! Configuration for codedrop
//!
//! Effective settings are resolved with precedence CLI > config file >
//! built-in defaults. Every key records which layer supplied it.

mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use cli_args::CliArgs;
pub use model::*;
pub use codedrop_utils::types::ConfigSource;

/// Directory holding the project config file
pub const CONFIG_DIR: &str = ".codedrop";

/// Config file name inside [`CONFIG_DIR`]
pub const CONFIG_FILE: &str = "config.toml";
