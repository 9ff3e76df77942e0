//! Block parser: recovers `(path, content)` artifacts from a response
//!
//! A single forward pass over the lines. Outside a fence, prose lines feed a
//! five-line window and may set a pending filename. An opening fence falls
//! back to the window when nothing is pending. A closing fence resolves the
//! name (pending, else a default from the language hint) and upserts the
//! artifact. Blocks left open at end of input are dropped.

mod matchers;
mod naming;
mod state;

pub use matchers::{MAX_HEADING_LINE_CHARS, MatchStrategy, heading_candidate, lookback_candidate};
pub use naming::{DefaultNamer, default_name, language_extension};
pub use state::{ParseEvent, ParseState, WINDOW_SIZE};

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::filename::extension_of;

/// Three backticks; recognized anywhere in a line
pub const FENCE: &str = "```";

/// How an artifact got its path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "strategy", rename_all = "snake_case")]
pub enum PathOrigin {
    /// Recovered from prose by a matcher
    Recovered(MatchStrategy),
    /// Generated from the fence language hint
    Default,
}

/// One recovered file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedArtifact {
    /// Relative path; unique within one parse
    pub path: String,
    /// File text with trailing whitespace trimmed
    pub content: String,
    /// Lower-cased extension of `path`
    pub language: String,
    pub origin: PathOrigin,
}

impl ParsedArtifact {
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<String>, origin: PathOrigin) -> Self {
        let path = path.into();
        Self {
            language: extension_of(&path),
            path,
            content: content.into(),
            origin,
        }
    }
}

/// Result of inserting into an [`ArtifactSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    /// Existing entry's content replaced; position kept
    Replaced,
}

/// Ordered artifacts keyed by path
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    items: Vec<ParsedArtifact>,
    index: HashMap<String, usize>,
}

impl ArtifactSet {
    /// Insert, or replace content in place when the path is already present.
    pub fn upsert(&mut self, artifact: ParsedArtifact) -> Upsert {
        match self.index.get(&artifact.path) {
            Some(&pos) => {
                self.items[pos] = artifact;
                Upsert::Replaced
            }
            None => {
                self.index.insert(artifact.path.clone(), self.items.len());
                self.items.push(artifact);
                Upsert::Inserted
            }
        }
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<ParsedArtifact> {
        self.items
    }
}

/// Everything one parse produced
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub artifacts: Vec<ParsedArtifact>,
    /// Transitions worth showing in verbose mode, in order
    pub events: Vec<ParseEvent>,
}

/// Parse a response into artifacts.
///
/// ```rust
/// use codedrop_engine::parse::parse;
///
/// let response = "FILE: hello.py\n```python\nprint('hi')\n```\n";
/// let outcome = parse(response);
/// assert_eq!(outcome.artifacts.len(), 1);
/// assert_eq!(outcome.artifacts[0].path, "hello.py");
/// assert_eq!(outcome.artifacts[0].content, "print('hi')");
/// ```
#[must_use]
pub fn parse(response: &str) -> ParseOutcome {
    let state = response
        .lines()
        .fold(ParseState::default(), ParseState::step);
    let outcome = state.finish();

    if outcome.artifacts.is_empty() {
        debug!(
            code_blocks = count_code_blocks(response),
            "no artifacts recovered"
        );
    }
    outcome
}

/// Fenced blocks in `text`: fence markers halved.
#[must_use]
pub fn count_code_blocks(text: &str) -> usize {
    text.matches(FENCE).count() / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(outcome: &ParseOutcome) -> Vec<&str> {
        outcome.artifacts.iter().map(|a| a.path.as_str()).collect()
    }

    #[test]
    fn test_file_markers_name_blocks() {
        let response = "\
Here are your files.

FILE: index.html
```html
<!DOCTYPE html>
<html></html>
```

FILE: styles.css
```css
body { margin: 0; }
```
";
        let outcome = parse(response);
        assert_eq!(paths(&outcome), vec!["index.html", "styles.css"]);
        assert_eq!(outcome.artifacts[0].content, "<!DOCTYPE html>\n<html></html>");
        assert_eq!(outcome.artifacts[0].language, "html");
        assert_eq!(
            outcome.artifacts[0].origin,
            PathOrigin::Recovered(MatchStrategy::FileMarker)
        );
    }

    #[test]
    fn test_duplicate_path_keeps_first_position_latest_content() {
        let response = "\
FILE: a.txt
```
first
```
FILE: b.txt
```
middle
```
FILE: a.txt
```
second
```
";
        let outcome = parse(response);
        assert_eq!(paths(&outcome), vec!["a.txt", "b.txt"]);
        assert_eq!(outcome.artifacts[0].content, "second");
        assert!(outcome
            .events
            .iter()
            .any(|e| matches!(e, ParseEvent::Replaced { path } if path == "a.txt")));
    }

    #[test]
    fn test_unmarked_html_blocks_get_default_names() {
        let response = "```html\n<p>one</p>\n```\n\n```html\n<p>two</p>\n```\n";
        let outcome = parse(response);
        assert_eq!(paths(&outcome), vec!["index.html", "page1.html"]);
        assert_eq!(outcome.artifacts[1].origin, PathOrigin::Default);
    }

    #[test]
    fn test_unmarked_block_never_overwrites_marked_page() {
        let response = "\
FILE: index.html
```html
<main>real page</main>
```

Example snippet:
```html
<p>x</p>
```
";
        let outcome = parse(response);
        assert_eq!(paths(&outcome), vec!["index.html", "page1.html"]);
        assert_eq!(outcome.artifacts[0].content, "<main>real page</main>");
        assert_eq!(outcome.artifacts[1].content, "<p>x</p>");
        assert!(!outcome
            .events
            .iter()
            .any(|e| matches!(e, ParseEvent::Replaced { .. })));
    }

    #[test]
    fn test_default_name_skips_paths_already_recovered() {
        let response = "\
FILE: page1.html
```html
<p>one</p>
```
```html
<p>two</p>
```
";
        assert_eq!(paths(&parse(response)), vec!["page1.html", "page2.html"]);
    }

    #[test]
    fn test_default_counters_are_per_extension() {
        let response = "\
```css
a {}
```
```js
let x;
```
```css
b {}
```
```python
pass
```
```toml
k = 1
```
";
        let outcome = parse(response);
        assert_eq!(
            paths(&outcome),
            vec!["styles.css", "script.js", "styles1.css", "file0.py", "file0.toml"]
        );
    }

    #[test]
    fn test_lookback_window_finds_name_in_prose() {
        let response = "\
Here's the updated src/app.js file:

```javascript
console.log(1);
```
";
        let outcome = parse(response);
        assert_eq!(paths(&outcome), vec!["src/app.js"]);
        assert_eq!(
            outcome.artifacts[0].origin,
            PathOrigin::Recovered(MatchStrategy::BareToken)
        );
    }

    #[test]
    fn test_lookback_window_holds_five_lines() {
        let response = "\
Create notes.md as follows
one
two
three
four
five
```md
# Notes
```
";
        // notes.md fell out of the window; the hint names the block instead
        assert_eq!(paths(&parse(response)), vec!["file0.md"]);
    }

    #[test]
    fn test_bold_filename_heading_sets_pending() {
        let response = "**main.py**\n\nSome explanation of the code below.\n```python\nprint(1)\n```\n";
        assert_eq!(paths(&parse(response)), vec!["main.py"]);
    }

    #[test]
    fn test_pending_name_is_consumed_by_one_block() {
        let response = "FILE: a.txt\n```\nA\n```\n```\nB\n```\n";
        // Second block has no name and no hint
        assert_eq!(paths(&parse(response)), vec!["a.txt"]);
    }

    #[test]
    fn test_empty_block_is_skipped_and_clears_pending() {
        let response = "FILE: a.txt\n```\n   \n\n```\n```html\n<b>x</b>\n```\n";
        assert_eq!(paths(&parse(response)), vec!["index.html"]);
    }

    #[test]
    fn test_unterminated_block_is_dropped() {
        let response = "FILE: done.txt\n```\nok\n```\nFILE: cut.txt\n```\npartial";
        assert_eq!(paths(&parse(response)), vec!["done.txt"]);
    }

    #[test]
    fn test_indented_and_annotated_fences() {
        let response = "FILE: x.sh\n   ```bash title=\"x\"\necho hi\n   ```\n";
        let outcome = parse(response);
        assert_eq!(paths(&outcome), vec!["x.sh"]);
        assert_eq!(outcome.artifacts[0].content, "echo hi");
    }

    #[test]
    fn test_content_keeps_leading_and_interior_whitespace() {
        let response = "FILE: a.py\n```python\n\n    def f():\n\n        pass\n\n\n```\n";
        assert_eq!(
            parse(response).artifacts[0].content,
            "\n    def f():\n\n        pass"
        );
    }

    #[test]
    fn test_content_lines_containing_fence_close_the_block() {
        let response = "FILE: README.md\n```md\nUse ```code``` inline\nafter\n```\n";
        let outcome = parse(response);
        assert_eq!(outcome.artifacts.len(), 0);
    }

    #[test]
    fn test_no_fences_no_artifacts() {
        let outcome = parse("FILE: a.txt\nno code here");
        assert!(outcome.artifacts.is_empty());
    }

    #[test]
    fn test_count_code_blocks() {
        assert_eq!(count_code_blocks("```a\nx\n```\n```\ny\n```"), 2);
        assert_eq!(count_code_blocks("```"), 0);
        assert_eq!(count_code_blocks("no fences"), 0);
    }

    #[test]
    fn test_artifact_set_upsert() {
        let mut set = ArtifactSet::default();
        let origin = PathOrigin::Default;
        assert_eq!(set.upsert(ParsedArtifact::new("a", "1", origin)), Upsert::Inserted);
        assert_eq!(set.upsert(ParsedArtifact::new("b", "2", origin)), Upsert::Inserted);
        assert_eq!(set.upsert(ParsedArtifact::new("a", "3", origin)), Upsert::Replaced);
        assert_eq!(set.len(), 2);
        let items = set.into_vec();
        assert_eq!(items[0].content, "3");
        assert_eq!(items[1].path, "b");
    }
}
