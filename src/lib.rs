//! codedrop - turn free-form model responses into files on disk
//!
//! codedrop asks a generation backend for code, recovers every file the
//! reply contains, writes them under a working directory, verifies each
//! write by reading it back, and warns when the output looks incomplete.
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Interactive session writing into ./site
//! codedrop -o site
//!
//! # One request against the local Ollama
//! codedrop run "create a landing page with a stylesheet"
//!
//! # Offline: materialize a saved response
//! codedrop replay response.md --request "add a contact page"
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use codedrop::engine::{Agent, AgentOptions, WorkspaceFs};
//! use codedrop::llm::ScriptedBackend;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(ScriptedBackend::with_reply(
//!     "FILE: hello.txt\n```\nhi\n```\n",
//! ));
//! let store = WorkspaceFs::open("out", false)?;
//! let mut agent = Agent::new(backend, Box::new(store), AgentOptions::default());
//! let outcome = agent.process_request("say hi").await;
//! assert!(outcome.success);
//! # Ok(())
//! # }
//! ```
//!
//! # Layout
//!
//! - [`engine`]: parser, materializer, completeness audit, [`Agent`](engine::Agent)
//! - [`llm`]: backend trait, Ollama client, scripted backend
//! - [`Config`]: layered configuration
//! - [`cli`]: the `codedrop` binary

pub mod cli;

pub use codedrop_config as config;
pub use codedrop_engine as engine;
pub use codedrop_llm as llm;

pub use codedrop_config::{CliArgs, Config};
pub use codedrop_engine::{ParsedArtifact, RequestOutcome, WriteOutcome};
pub use codedrop_utils::error::{CodedropError, UserFriendlyError};
pub use codedrop_utils::exit_codes::ExitCode;
