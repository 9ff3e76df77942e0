//! Command implementations

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::engine::{Agent, AgentOptions, CallbackSink, StatusSink, StdoutSink, WorkspaceFs};
use crate::llm::{LlmBackend, LlmError, OllamaBackend, ScriptedBackend, backend_from_config};
use crate::{CodedropError, Config, ExitCode, RequestOutcome};

/// Build the backend and make sure it answers.
///
/// When no layer chose a model, switch to the first one the backend lists.
pub(crate) async fn connect(config: &Config) -> Result<OllamaBackend, CodedropError> {
    let mut backend = backend_from_config(config)?;

    if !backend.is_available().await {
        return Err(LlmError::Transport(format!(
            "Ollama is not reachable at {}. Start it with 'ollama serve'.",
            backend.base_url()
        ))
        .into());
    }

    if config.model_is_default() {
        match backend.list_models().await {
            Ok(models) => match models.first() {
                Some(first) if first != backend.model() => {
                    println!("[i] Using model: {first}");
                    backend.set_model(first.clone());
                }
                Some(_) => {}
                None => println!(
                    "[!] No models installed. Pull one with 'ollama pull {}'.",
                    backend.model()
                ),
            },
            Err(e) => tracing::warn!(error = %e, "could not list models"),
        }
    }

    Ok(backend)
}

/// Agent over the configured output directory.
pub(crate) fn build_agent(
    config: &Config,
    backend: Arc<dyn LlmBackend>,
    model: &str,
) -> Result<Agent, CodedropError> {
    let store = WorkspaceFs::open(&config.defaults.output_dir, config.defaults.allow_links)?;
    let mut options = AgentOptions::from_config(config);
    options.model = model.to_string();
    Ok(Agent::new(backend, Box::new(store), options))
}

/// Status lines go to stderr when stdout carries JSON.
fn sink_for(json: bool) -> Arc<dyn StatusSink> {
    if json {
        Arc::new(CallbackSink::new(|_, line| eprintln!("{line}")))
    } else {
        Arc::new(StdoutSink)
    }
}

fn finish(outcome: &RequestOutcome, json: bool) -> Result<ExitCode> {
    if json {
        let rendered =
            serde_json::to_string_pretty(outcome).context("Failed to serialize outcome")?;
        println!("{rendered}");
    }
    Ok(ExitCode::from_success(outcome.success))
}

/// `codedrop run <request>`
pub(crate) async fn execute_run(config: &Config, request: &str, json: bool) -> Result<ExitCode> {
    let backend = connect(config).await?;
    let model = backend.model().to_string();
    let mut agent = build_agent(config, Arc::new(backend), &model)?.with_status_sink(sink_for(json));

    let outcome = agent.process_request(request).await;
    finish(&outcome, json)
}

/// `codedrop replay <file>`
pub(crate) async fn execute_replay(
    config: &Config,
    response_file: &Path,
    request: Option<&str>,
    json: bool,
) -> Result<ExitCode> {
    let response = read_response(response_file)?;
    let backend = Arc::new(ScriptedBackend::with_reply(response));
    let mut agent = build_agent(config, backend, &config.llm.ollama.model)?
        .with_status_sink(sink_for(json));

    let outcome = agent.process_request(request.unwrap_or_default()).await;
    finish(&outcome, json)
}

fn read_response(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read response from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read response file: {}", path.display()))
}

/// `codedrop models`
pub(crate) async fn execute_models(config: &Config) -> Result<ExitCode> {
    let backend = backend_from_config(config).map_err(CodedropError::from)?;
    if !backend.is_available().await {
        return Err(CodedropError::from(LlmError::Transport(format!(
            "Ollama is not reachable at {}",
            backend.base_url()
        )))
        .into());
    }

    let models = backend.list_models().await.map_err(CodedropError::from)?;
    print_models(&models, backend.model());
    Ok(ExitCode::SUCCESS)
}

pub(crate) fn print_models(models: &[String], current: &str) {
    if models.is_empty() {
        println!("No models installed.");
        return;
    }
    println!("Available models:");
    for model in models {
        let marker = if model == current { "*" } else { " " };
        println!("  {marker} {model}");
    }
}
