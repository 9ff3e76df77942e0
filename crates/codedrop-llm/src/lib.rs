//! Generation backends for codedrop
//!
//! [`LlmBackend`] is the only seam the engine sees. [`OllamaBackend`] is the
//! network implementation; [`ScriptedBackend`] replays canned replies.

pub mod envelope;
mod http_client;
mod ollama_backend;
mod scripted_backend;
mod types;

pub use codedrop_utils::error::LlmError;
pub use ollama_backend::OllamaBackend;
pub use scripted_backend::ScriptedBackend;
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

use codedrop_config::{Config, DEFAULT_PROVIDER};

/// Build the backend named by `[llm] provider`.
///
/// # Errors
///
/// [`LlmError::Unsupported`] for any provider other than `ollama`, or
/// [`LlmError::Misconfiguration`] when the HTTP client cannot be built.
pub fn backend_from_config(config: &Config) -> Result<OllamaBackend, LlmError> {
    match config.llm.provider.as_str() {
        DEFAULT_PROVIDER => OllamaBackend::from_config(&config.llm.ollama),
        other => Err(LlmError::Unsupported(format!("provider '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_builds_ollama() {
        let config = Config::defaults();
        let backend = backend_from_config(&config).unwrap();
        assert_eq!(backend.base_url(), "http://127.0.0.1:11434");
        assert_eq!(backend.model(), "llama3.2");
    }

    #[test]
    fn test_factory_rejects_other_providers() {
        let mut config = Config::defaults();
        config.llm.provider = "anthropic".to_string();
        assert!(matches!(
            backend_from_config(&config),
            Err(LlmError::Unsupported(_))
        ));
    }
}
