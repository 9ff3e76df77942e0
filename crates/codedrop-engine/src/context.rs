//! Existing-files block appended to a request
//!
//! Gives the model the current project so it can output complete updated
//! files instead of fragments.

use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use codedrop_config::ContextConfig;
use tracing::debug;

use crate::filename::extension_of;
use crate::parse::FENCE;
use crate::workspace::FileStore;

/// Extensions worth showing the model
pub const CODE_EXTENSIONS: &[&str] = &[
    "html", "htm", "css", "scss", "js", "jsx", "ts", "tsx", "py", "c", "cpp", "h", "hpp", "java",
    "rs", "go", "json", "xml", "yaml", "yml", "md", "txt", "sh", "bat",
];

pub const TRUNCATION_MARKER: &str = "\n\n... [FILE TRUNCATED] ...\n";

const HEADER: &str = "\n\n--- EXISTING FILES IN PROJECT ---\n";
const INSTRUCTION: &str =
    "These files already exist. When modifying, output the COMPLETE updated file.\n\n";
const FOOTER: &str = "--- END EXISTING FILES ---\n";

/// One file as it will appear in the block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFile {
    pub path: Utf8PathBuf,
    pub content: String,
    pub truncated: bool,
}

#[must_use]
pub fn is_code_file(path: &Utf8Path) -> bool {
    let ext = extension_of(path.as_str());
    CODE_EXTENSIONS.contains(&ext.as_str())
}

/// Relative slash paths of visible regular files under `root`, sorted.
#[must_use]
pub fn candidate_paths(root: &Path) -> Vec<Utf8PathBuf> {
    let mut found = Vec::new();
    walk(root, Utf8Path::new(""), &mut found);
    found.sort();
    found
}

fn walk(dir: &Path, rel: &Utf8Path, found: &mut Vec<Utf8PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(Result::ok) {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let child = rel.join(&name);
        if file_type.is_dir() {
            walk(&entry.path(), &child, found);
        } else if file_type.is_file() && is_code_file(&child) {
            found.push(child);
        }
    }
}

/// Cut `content` to at most `max` bytes on a char boundary.
#[must_use]
pub fn preview(content: &str, max: usize) -> &str {
    if content.len() <= max {
        return content;
    }
    let mut end = max;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}

/// Files to include, honoring the configured limits.
#[must_use]
pub fn collect_files(store: &dyn FileStore, limits: &ContextConfig) -> Vec<ContextFile> {
    let mut files = Vec::new();
    for path in candidate_paths(store.working_dir()) {
        if files.len() >= limits.max_files {
            break;
        }
        let content = store.read_file(path.as_str());
        if content.is_empty() {
            continue;
        }
        let file = if content.len() > limits.max_file_bytes {
            ContextFile {
                content: format!(
                    "{}{TRUNCATION_MARKER}",
                    preview(&content, limits.truncated_preview_bytes)
                ),
                path,
                truncated: true,
            }
        } else {
            ContextFile {
                path,
                content,
                truncated: false,
            }
        };
        files.push(file);
    }
    files
}

/// Render the block; empty when no file qualifies.
#[must_use]
pub fn render(files: &[ContextFile]) -> String {
    if files.is_empty() {
        return String::new();
    }
    let mut block = String::from(HEADER);
    block.push_str(INSTRUCTION);
    for file in files {
        block.push_str(&format!(
            "FILE: {}\n{FENCE}\n{}\n{FENCE}\n\n",
            file.path, file.content
        ));
    }
    block.push_str(FOOTER);
    block
}

/// Collect and render in one step.
#[must_use]
pub fn existing_files_context(store: &dyn FileStore, limits: &ContextConfig) -> String {
    let files = collect_files(store, limits);
    debug!(
        files = files.len(),
        truncated = files.iter().filter(|f| f.truncated).count(),
        "existing files context built"
    );
    render(&files)
}
