use std::collections::HashMap;
use std::path::{Path, PathBuf};

use codedrop_utils::error::ConfigError;
use codedrop_utils::types::ConfigSource;
use tracing::debug;

use crate::model::TomlConfig;
use crate::{CONFIG_DIR, CONFIG_FILE, CliArgs, Config};

/// Markers that end the upward config search
const REPO_ROOT_MARKERS: [&str; 3] = [".git", ".hg", ".svn"];

fn apply<T>(
    slot: &mut T,
    value: Option<T>,
    key: &str,
    source: ConfigSource,
    attribution: &mut HashMap<String, ConfigSource>,
) {
    if let Some(value) = value {
        *slot = value;
        attribution.insert(key.to_string(), source);
    }
}

/// `true` for a set flag, `None` otherwise
fn flag(set: bool) -> Option<bool> {
    set.then_some(true)
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Searches upward from the current directory unless `cli_args` names a
    /// config file explicitly.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let start_dir = std::env::current_dir().map_err(|e| {
            ConfigError::InvalidFile(format!("cannot read current directory: {e}"))
        })?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Same as [`Config::discover`] with an explicit starting directory.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = Config::defaults();

        let config_path = match &cli_args.config_path {
            Some(explicit) => Some(explicit.clone()),
            None => Self::discover_config_file_from(start_dir),
        };

        if let Some(path) = &config_path {
            let file = Self::load_config_file(path)?;
            config.apply_file(file);
            debug!(path = %path.display(), "loaded config file");
        }
        config.config_path = config_path;

        config.apply_cli(cli_args);
        config.validate()?;
        Ok(config)
    }

    /// Nearest `.codedrop/config.toml` at or above `start_dir`.
    ///
    /// The search stops after the first directory holding a repository
    /// marker, so a config outside the current repository is never picked up.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current_dir = Some(start_dir);

        while let Some(dir) = current_dir {
            let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
            if REPO_ROOT_MARKERS.iter().any(|m| dir.join(m).exists()) {
                break;
            }
            current_dir = dir.parent();
        }

        None
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))
    }

    fn apply_file(&mut self, file: TomlConfig) {
        let src = ConfigSource::Config;
        let attr = &mut self.source_attribution;

        if let Some(d) = file.defaults {
            apply(&mut self.defaults.output_dir, d.output_dir, "output_dir", src, attr);
            apply(&mut self.defaults.verbose, d.verbose, "verbose", src, attr);
            apply(&mut self.defaults.allow_links, d.allow_links, "allow_links", src, attr);
        }

        if let Some(llm) = file.llm {
            apply(&mut self.llm.provider, llm.provider, "llm.provider", src, attr);
            if let Some(o) = llm.ollama {
                let ollama = &mut self.llm.ollama;
                apply(&mut ollama.host, o.host, "llm.ollama.host", src, attr);
                apply(&mut ollama.port, o.port, "llm.ollama.port", src, attr);
                apply(&mut ollama.model, o.model, "llm.ollama.model", src, attr);
                apply(&mut ollama.timeout_secs, o.timeout_secs, "llm.ollama.timeout_secs", src, attr);
            }
        }

        if let Some(c) = file.context {
            let ctx = &mut self.context;
            apply(
                &mut ctx.include_existing_files,
                c.include_existing_files,
                "context.include_existing_files",
                src,
                attr,
            );
            apply(&mut ctx.max_files, c.max_files, "context.max_files", src, attr);
            apply(&mut ctx.max_file_bytes, c.max_file_bytes, "context.max_file_bytes", src, attr);
            apply(
                &mut ctx.truncated_preview_bytes,
                c.truncated_preview_bytes,
                "context.truncated_preview_bytes",
                src,
                attr,
            );
        }
    }

    fn apply_cli(&mut self, cli: &CliArgs) {
        let src = ConfigSource::Cli;
        let attr = &mut self.source_attribution;
        let ollama = &mut self.llm.ollama;

        apply(&mut self.defaults.output_dir, cli.output_dir.clone(), "output_dir", src, attr);
        apply(&mut self.defaults.verbose, flag(cli.verbose), "verbose", src, attr);
        apply(&mut self.defaults.allow_links, flag(cli.allow_links), "allow_links", src, attr);
        apply(&mut ollama.host, cli.host.clone(), "llm.ollama.host", src, attr);
        apply(&mut ollama.port, cli.port, "llm.ollama.port", src, attr);
        apply(&mut ollama.model, cli.model.clone(), "llm.ollama.model", src, attr);
        apply(&mut ollama.timeout_secs, cli.timeout_secs, "llm.ollama.timeout_secs", src, attr);
        apply(
            &mut self.context.include_existing_files,
            cli.no_context.then_some(false),
            "context.include_existing_files",
            src,
            attr,
        );
    }
}
