//! Prose left over once code blocks and `FILE:` headers are removed

use crate::parse::FENCE;

/// Non-empty prose lines outside fenced blocks, each newline-terminated.
///
/// Lines carrying a `FILE:` label (any case) are dropped. Shares the
/// parser's fence rule: a line containing three backticks toggles the
/// inside/outside flag and is itself dropped.
#[must_use]
pub fn extract_explanation(response: &str) -> String {
    let mut explanation = String::new();
    let mut inside = false;

    for line in response.lines() {
        if line.contains(FENCE) {
            inside = !inside;
            continue;
        }
        if inside || line.is_empty() {
            continue;
        }
        if line.to_ascii_uppercase().contains("FILE:") {
            continue;
        }
        explanation.push_str(line);
        explanation.push('\n');
    }

    explanation
}
