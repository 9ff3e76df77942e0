//! Default names for fenced blocks that carry no filename

use std::collections::HashMap;

/// Extension for a fence language hint; unknown hints are used as-is.
#[must_use]
pub fn language_extension(hint: &str) -> String {
    let lower = hint.to_ascii_lowercase();
    let ext = match lower.as_str() {
        "html" | "htm" => "html",
        "css" => "css",
        "scss" => "scss",
        "javascript" | "js" => "js",
        "jsx" => "jsx",
        "typescript" | "ts" => "ts",
        "tsx" => "tsx",
        "python" | "py" => "py",
        "cpp" | "c++" | "cxx" => "cpp",
        "c" => "c",
        "java" => "java",
        "rust" => "rs",
        "go" => "go",
        "ruby" => "rb",
        "php" => "php",
        "json" => "json",
        "xml" => "xml",
        "yaml" => "yaml",
        "yml" => "yml",
        "bash" | "sh" | "shell" => "sh",
        "bat" => "bat",
        "cmd" => "cmd",
        "sql" => "sql",
        "md" => "md",
        _ => return hint.to_string(),
    };
    ext.to_string()
}

/// Name for the `index`-th default-named block of extension `ext`.
#[must_use]
pub fn default_name(ext: &str, index: usize) -> String {
    match (ext, index) {
        ("html", 0) => "index.html".to_string(),
        ("html", n) => format!("page{n}.html"),
        ("css", 0) => "styles.css".to_string(),
        ("css", n) => format!("styles{n}.css"),
        ("js", 0) => "script.js".to_string(),
        ("js", n) => format!("script{n}.js"),
        (ext, n) => format!("file{n}.{ext}"),
    }
}

/// Per-extension counters, scoped to one parse
#[derive(Debug, Default, Clone)]
pub struct DefaultNamer {
    counters: HashMap<String, usize>,
}

impl DefaultNamer {
    /// Name the next block would get, without consuming it.
    ///
    /// Names for which `taken` holds are skipped. `None` for an empty hint.
    #[must_use]
    pub fn peek(&self, hint: &str, taken: impl Fn(&str) -> bool) -> Option<(String, String)> {
        if hint.is_empty() {
            return None;
        }
        let ext = language_extension(hint);
        let start = self.counters.get(&ext).copied().unwrap_or(0);
        let name = (start..)
            .map(|index| default_name(&ext, index))
            .find(|name| !taken(name))?;
        Some((name, ext))
    }

    /// Record that an artifact with `ext` was emitted, named or not.
    pub fn commit(&mut self, ext: &str) {
        *self.counters.entry(ext.to_string()).or_insert(0) += 1;
    }
}
