//! Request pipeline: prompt, backend, parse, materialize, audit
//!
//! [`Agent::process_request`] never fails outright. Every problem becomes a
//! status line plus `success = false` on the returned [`RequestOutcome`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use codedrop_config::{Config, ContextConfig};
use codedrop_llm::{LlmBackend, LlmInvocation};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audit::{AuditReport, audit};
use crate::context::existing_files_context;
use crate::explanation::extract_explanation;
use crate::materialize::{MaterializeReport, materialize_with};
use crate::parse::{ParsedArtifact, count_code_blocks, parse};
use crate::prompt::system_prompt;
use crate::status::{StatusSink, StdoutSink};
use crate::workspace::FileStore;

/// Per-agent settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOptions {
    pub model: String,
    pub timeout: Duration,
    pub verbose: bool,
    pub context: ContextConfig,
}

impl AgentOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.llm.ollama.model.clone(),
            timeout: Duration::from_secs(config.llm.ollama.timeout_secs),
            verbose: config.defaults.verbose,
            context: config.context.clone(),
        }
    }
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self::from_config(&Config::defaults())
    }
}

/// Everything one request produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestOutcome {
    pub success: bool,
    pub artifacts: Vec<ParsedArtifact>,
    pub report: MaterializeReport,
    pub audit: AuditReport,
    /// Fenced blocks seen in the response
    pub code_blocks: usize,
    pub explanation: String,
    /// Backend failure text
    pub error: Option<String>,
}

impl RequestOutcome {
    fn failed(error: String) -> Self {
        Self {
            success: false,
            error: Some(error),
            ..Self::default()
        }
    }
}

pub struct Agent {
    backend: Arc<dyn LlmBackend>,
    store: Box<dyn FileStore>,
    sink: Arc<dyn StatusSink>,
    options: AgentOptions,
    last_response: String,
    created_files: Vec<String>,
    context_summary: String,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("working_dir", &self.store.working_dir())
            .field("options", &self.options)
            .field("created_files", &self.created_files)
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Agent reporting to stdout.
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        store: Box<dyn FileStore>,
        options: AgentOptions,
    ) -> Self {
        Self {
            backend,
            store,
            sink: Arc::new(StdoutSink),
            options,
            last_response: String::new(),
            created_files: Vec::new(),
            context_summary: String::new(),
        }
    }

    #[must_use]
    pub fn with_status_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Run one request end to end.
    pub async fn process_request(&mut self, request: &str) -> RequestOutcome {
        self.trace(&format!("Processing request: {request}"));
        info!(model = %self.options.model, "processing request");

        let system = system_prompt(self.store.working_dir());
        let context = if self.options.context.include_existing_files {
            existing_files_context(self.store.as_ref(), &self.options.context)
        } else {
            String::new()
        };
        if !context.is_empty() {
            self.sink.emit("[i] Including existing project files in context...");
        }
        let message = format!("{request}{context}");

        self.trace("Sending request to backend...");
        let invocation = LlmInvocation::chat(
            self.options.model.clone(),
            self.options.timeout,
            system,
            message,
        );
        let response = match self.backend.invoke(invocation).await {
            Ok(result) => {
                debug!(
                    provider = %result.provider,
                    model = %result.model_used,
                    tokens_input = ?result.tokens_input,
                    tokens_output = ?result.tokens_output,
                    "response received"
                );
                result.raw_response
            }
            Err(e) => {
                warn!(error = %e, "backend call failed");
                self.last_response = format!("Error: Failed to get response from backend. {e}");
                self.sink.error(&self.last_response);
                return RequestOutcome::failed(e.to_string());
            }
        };

        self.last_response.clone_from(&response);
        self.trace("Received response from backend");
        if self.options.verbose {
            self.sink.emit(&format!(
                "\n=== RAW RESPONSE ===\n{response}\n=== END RESPONSE ===\n"
            ));
        }

        let parsed = parse(&response);
        if self.options.verbose {
            for event in &parsed.events {
                self.sink.emit(&event.to_string());
            }
        }
        let code_blocks = count_code_blocks(&response);

        if parsed.artifacts.is_empty() {
            self.report_no_files(&response, code_blocks);
            return RequestOutcome {
                success: true,
                code_blocks,
                ..RequestOutcome::default()
            };
        }

        let explanation = extract_explanation(&response);
        if !explanation.is_empty() {
            self.sink.emit(&format!("\n{explanation}"));
        }

        self.sink.emit(&format!("\nCreating {} file(s)...", parsed.artifacts.len()));
        let report = {
            let sink = &self.sink;
            materialize_with(self.store.as_ref(), &parsed.artifacts, |record| {
                if record.outcome.is_failure() {
                    sink.error(&record.status_line());
                } else {
                    sink.emit(&record.status_line());
                }
            })
        };

        let success = report.success();
        if success {
            self.sink.emit("\n[OK] All files created successfully!");
            self.sink.emit(&format!(
                "Location: {}",
                self.store.working_dir().display()
            ));
        } else {
            self.sink.error(&format!(
                "\n[!] {} of {} file(s) failed.",
                report.failures(),
                report.records.len()
            ));
        }

        let audit = audit(request, &report.created_files);
        for line in audit.lines() {
            self.sink.emit(&line);
        }

        self.created_files.clone_from(&report.created_files);
        self.context_summary = format!("Created files: {}", self.created_files.join(", "));
        info!(
            files = report.records.len(),
            failures = report.failures(),
            warnings = audit.warnings.len(),
            "request finished"
        );

        RequestOutcome {
            success,
            artifacts: parsed.artifacts,
            report,
            audit,
            code_blocks,
            explanation,
            error: None,
        }
    }

    fn report_no_files(&self, response: &str, code_blocks: usize) {
        self.sink.emit(&format!("\n{response}"));
        self.sink.emit("\n[No files detected in response]");
        if code_blocks > 0 {
            self.sink.emit(&format!(
                "[Debug] Found {code_blocks} code block(s) but couldn't extract filenames."
            ));
            self.sink.emit("[Debug] The model may not be using the expected format.");
        }
        self.sink.emit("Tip: Use /verbose for detailed debug output.");
    }

    /// Verbose-only progress line.
    fn trace(&self, message: &str) {
        if self.options.verbose {
            self.sink.emit(&format!("[Agent] {message}"));
        }
    }

    #[must_use]
    pub fn last_response(&self) -> &str {
        &self.last_response
    }

    #[must_use]
    pub fn created_files(&self) -> &[String] {
        &self.created_files
    }

    #[must_use]
    pub fn context_summary(&self) -> &str {
        &self.context_summary
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.options.verbose
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.options.verbose = verbose;
    }

    pub fn set_status_sink(&mut self, sink: Arc<dyn StatusSink>) {
        self.sink = sink;
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.options.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.options.model = model.into();
    }

    #[must_use]
    pub fn working_dir(&self) -> &Path {
        self.store.working_dir()
    }

    #[must_use]
    pub fn store(&self) -> &dyn FileStore {
        self.store.as_ref()
    }

    /// Replace the file store, e.g. after a working-directory change.
    pub fn set_store(&mut self, store: Box<dyn FileStore>) {
        self.store = store;
    }

    #[must_use]
    pub fn options(&self) -> &AgentOptions {
        &self.options
    }
}
