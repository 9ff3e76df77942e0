//! Response materialization engine
//!
//! Turns a free-form model response into files on disk:
//!
//! 1. [`parse`] recovers `(path, content)` artifacts from prose and fences.
//! 2. [`explanation`] keeps the prose for display.
//! 3. [`materialize`] writes each artifact through a [`FileStore`] and
//!    verifies it by reading it back.
//! 4. [`audit`] compares the request with what came out.
//!
//! [`Agent`] runs the whole pipeline against an [`LlmBackend`](codedrop_llm::LlmBackend).

pub mod agent;
pub mod audit;
pub mod context;
pub mod explanation;
pub mod filename;
pub mod materialize;
pub mod parse;
pub mod prompt;
pub mod status;
pub mod workspace;

pub use agent::{Agent, AgentOptions, RequestOutcome};
pub use audit::{AuditReport, AuditSignals, AuditWarning};
pub use materialize::{MaterializeReport, WriteOutcome, WriteRecord};
pub use parse::{ParseOutcome, ParsedArtifact, PathOrigin};
pub use status::{BufferSink, CallbackSink, ChannelSink, StatusLevel, StatusLine, StatusSink, StdoutSink};
pub use workspace::{FileStore, WorkspaceFs};
