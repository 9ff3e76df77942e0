use codedrop_utils::error::ConfigError;

use crate::{Config, DEFAULT_PROVIDER};

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

impl Config {
    /// Reject values the engine or transport cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.provider != DEFAULT_PROVIDER {
            return Err(invalid(
                "llm.provider",
                format!("'{}' (only 'ollama' is supported)", self.llm.provider),
            ));
        }

        let ollama = &self.llm.ollama;
        if ollama.host.trim().is_empty() {
            return Err(ConfigError::MissingRequired("llm.ollama.host".to_string()));
        }
        if ollama.port == 0 {
            return Err(invalid("llm.ollama.port", "0 (must be 1-65535)"));
        }
        if ollama.model.trim().is_empty() {
            return Err(ConfigError::MissingRequired("llm.ollama.model".to_string()));
        }
        if ollama.timeout_secs == 0 {
            return Err(invalid("llm.ollama.timeout_secs", "0 (must be at least 1)"));
        }

        if self.context.max_files == 0 {
            return Err(invalid("context.max_files", "0 (must be at least 1)"));
        }
        if self.context.truncated_preview_bytes > self.context.max_file_bytes {
            return Err(invalid(
                "context.truncated_preview_bytes",
                format!(
                    "{} (must not exceed context.max_file_bytes = {})",
                    self.context.truncated_preview_bytes, self.context.max_file_bytes
                ),
            ));
        }

        Ok(())
    }
}
