use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use codedrop_utils::types::ConfigSource;

pub const DEFAULT_PROVIDER: &str = "ollama";
pub const DEFAULT_OLLAMA_HOST: &str = "127.0.0.1";
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAX_CONTEXT_FILES: usize = 20;
pub const DEFAULT_MAX_FILE_BYTES: usize = 30_000;
pub const DEFAULT_TRUNCATED_PREVIEW_BYTES: usize = 1_000;

/// Effective configuration after all layers are applied
#[derive(Debug, Clone)]
pub struct Config {
    pub defaults: Defaults,
    pub llm: LlmConfig,
    pub context: ContextConfig,
    /// Which layer supplied each dotted key
    pub source_attribution: HashMap<String, ConfigSource>,
    /// The config file that was loaded, if any
    pub config_path: Option<PathBuf>,
}

/// `[defaults]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    /// Working directory generated files are written under
    pub output_dir: PathBuf,
    pub verbose: bool,
    /// Permit symlinks and hardlinks inside `output_dir`
    pub allow_links: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            verbose: false,
            allow_links: false,
        }
    }
}

/// `[llm]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub provider: String,
    pub ollama: OllamaConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// `[llm.ollama]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaConfig {
    pub host: String,
    pub port: u16,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLLAMA_HOST.to_string(),
            port: DEFAULT_OLLAMA_PORT,
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl OllamaConfig {
    /// Base URL for the HTTP API. A host that already carries a scheme is kept.
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}:{}", self.port)
        } else {
            format!("http://{host}:{}", self.port)
        }
    }
}

/// `[context]`: the existing-files block appended to requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    pub include_existing_files: bool,
    pub max_files: usize,
    /// Files larger than this are replaced by a preview
    pub max_file_bytes: usize,
    pub truncated_preview_bytes: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            include_existing_files: true,
            max_files: DEFAULT_MAX_CONTEXT_FILES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            truncated_preview_bytes: DEFAULT_TRUNCATED_PREVIEW_BYTES,
        }
    }
}

impl Config {
    /// Built-in defaults only, every key attributed to [`ConfigSource::Default`].
    #[must_use]
    pub fn defaults() -> Self {
        let source_attribution = crate::sources::CONFIG_KEYS
            .iter()
            .map(|key| ((*key).to_string(), ConfigSource::Default))
            .collect();
        Self {
            defaults: Defaults::default(),
            llm: LlmConfig::default(),
            context: ContextConfig::default(),
            source_attribution,
            config_path: None,
        }
    }

    /// Source of a dotted key such as `llm.ollama.model`.
    #[must_use]
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.source_attribution
            .get(key)
            .copied()
            .unwrap_or(ConfigSource::Default)
    }

    /// True when no layer chose the model, so the CLI may pick one.
    #[must_use]
    pub fn model_is_default(&self) -> bool {
        self.source_of("llm.ollama.model") == ConfigSource::Default
    }
}

/// On-disk layout of `.codedrop/config.toml`; every field optional
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TomlConfig {
    pub defaults: Option<TomlDefaults>,
    pub llm: Option<TomlLlm>,
    pub context: Option<TomlContext>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TomlDefaults {
    pub output_dir: Option<PathBuf>,
    pub verbose: Option<bool>,
    pub allow_links: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TomlLlm {
    pub provider: Option<String>,
    pub ollama: Option<TomlOllama>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TomlOllama {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TomlContext {
    pub include_existing_files: Option<bool>,
    pub max_files: Option<usize>,
    pub max_file_bytes: Option<usize>,
    pub truncated_preview_bytes: Option<usize>,
}
