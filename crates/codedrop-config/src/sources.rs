use std::collections::BTreeMap;

use crate::Config;

/// Every dotted key the config layers can set
pub(crate) const CONFIG_KEYS: [&str; 12] = [
    "output_dir",
    "verbose",
    "allow_links",
    "llm.provider",
    "llm.ollama.host",
    "llm.ollama.port",
    "llm.ollama.model",
    "llm.ollama.timeout_secs",
    "context.include_existing_files",
    "context.max_files",
    "context.max_file_bytes",
    "context.truncated_preview_bytes",
];

impl Config {
    /// Effective values with their source label, keyed by dotted name.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let values = [
            self.defaults.output_dir.display().to_string(),
            self.defaults.verbose.to_string(),
            self.defaults.allow_links.to_string(),
            self.llm.provider.clone(),
            self.llm.ollama.host.clone(),
            self.llm.ollama.port.to_string(),
            self.llm.ollama.model.clone(),
            self.llm.ollama.timeout_secs.to_string(),
            self.context.include_existing_files.to_string(),
            self.context.max_files.to_string(),
            self.context.max_file_bytes.to_string(),
            self.context.truncated_preview_bytes.to_string(),
        ];

        CONFIG_KEYS
            .iter()
            .zip(values)
            .map(|(key, value)| {
                (
                    (*key).to_string(),
                    (value, self.source_of(key).to_string()),
                )
            })
            .collect()
    }

    /// `key = value  [source]` lines for display.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        self.effective_config()
            .into_iter()
            .map(|(key, (value, source))| format!("{key} = {value}  [{source}]"))
            .collect()
    }
}
