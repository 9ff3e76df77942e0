//! Foundation utilities shared by the codedrop crates
//!
//! - [`error`]: typed error taxonomy with user-facing reporting
//! - [`logging`]: tracing subscriber setup
//! - [`paths`]: sandboxed path resolution for the output directory
//! - [`atomic_write`]: temp file + fsync + rename writes
//! - [`exit_codes`]: process exit codes for the CLI

pub mod atomic_write;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod paths;
pub mod types;
