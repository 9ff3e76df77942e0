use std::collections::VecDeque;
use std::fmt;

use tracing::debug;

use crate::filename::extension_of;

use super::matchers::{MatchStrategy, heading_candidate, lookback_candidate};
use super::naming::{DefaultNamer, language_extension};
use super::{ArtifactSet, FENCE, ParseOutcome, ParsedArtifact, PathOrigin, Upsert};

/// Prose lines remembered before a fence
pub const WINDOW_SIZE: usize = 5;

/// Parser transition worth reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    /// A prose line set the pending filename
    PendingName { path: String, strategy: MatchStrategy },
    /// An opening fence found its name in the window
    WindowName { path: String, strategy: MatchStrategy },
    Recovered { path: String, bytes: usize },
    /// Same path seen again; content replaced in place
    Replaced { path: String },
    /// Block closed with neither a name nor a language hint
    Unnamed,
    /// Block closed with only whitespace inside
    EmptyBlock,
}

impl fmt::Display for ParseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PendingName { path, strategy } => {
                write!(f, "[Parser] Found filename ({strategy}) -> {path}")
            }
            Self::WindowName { path, strategy } => {
                write!(f, "[Parser] Found filename before block ({strategy}) -> {path}")
            }
            Self::Recovered { path, bytes } => {
                write!(f, "[Parser] Found file: {path} ({bytes} bytes)")
            }
            Self::Replaced { path } => {
                write!(f, "[Parser] Replaced earlier block for {path}")
            }
            Self::Unnamed => write!(f, "[Parser] Skipped code block without filename"),
            Self::EmptyBlock => write!(f, "[Parser] Skipped empty code block"),
        }
    }
}

enum Naming {
    Recovered(MatchStrategy),
    /// Uncommitted default for this extension
    Default(String),
}

/// Scanner state threaded through the fold over lines
#[derive(Debug, Default, Clone)]
pub struct ParseState {
    in_block: bool,
    /// Lines of the open block
    buffer: Vec<String>,
    /// Recent prose lines, oldest first
    window: VecDeque<String>,
    pending: Option<(String, MatchStrategy)>,
    hint: String,
    namer: DefaultNamer,
    artifacts: ArtifactSet,
    events: Vec<ParseEvent>,
}

impl ParseState {
    #[must_use]
    pub fn in_block(&self) -> bool {
        self.in_block
    }

    #[must_use]
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_ref().map(|(path, _)| path.as_str())
    }

    #[must_use]
    pub fn window(&self) -> &VecDeque<String> {
        &self.window
    }

    /// Consume one line.
    #[must_use]
    pub fn step(mut self, line: &str) -> Self {
        match (self.in_block, line.find(FENCE)) {
            (false, Some(at)) => self.open_block(&line[at + FENCE.len()..]),
            (false, None) => self.prose_line(line),
            (true, Some(_)) => self.close_block(),
            (true, None) => self.buffer.push(line.to_string()),
        }
        self
    }

    /// End of input. An open block is discarded.
    #[must_use]
    pub fn finish(self) -> ParseOutcome {
        ParseOutcome {
            artifacts: self.artifacts.into_vec(),
            events: self.events,
        }
    }

    fn prose_line(&mut self, line: &str) {
        self.window.push_back(line.to_string());
        while self.window.len() > WINDOW_SIZE {
            self.window.pop_front();
        }

        if let Some((path, strategy)) = heading_candidate(line) {
            debug!(path = %path, strategy = %strategy, "filename marker found");
            self.events.push(ParseEvent::PendingName {
                path: path.clone(),
                strategy,
            });
            self.pending = Some((path, strategy));
        }
    }

    fn open_block(&mut self, after_fence: &str) {
        self.in_block = true;
        self.buffer.clear();
        self.hint = after_fence
            .split(char::is_whitespace)
            .next()
            .unwrap_or_default()
            .to_string();

        if self.pending.is_none()
            && let Some((path, strategy)) = lookback_candidate(self.window.iter().rev())
        {
            debug!(path = %path, strategy = %strategy, "filename found in window");
            self.events.push(ParseEvent::WindowName {
                path: path.clone(),
                strategy,
            });
            self.pending = Some((path, strategy));
        }
    }

    fn close_block(&mut self) {
        self.in_block = false;

        let content = self.buffer.join("\n");
        let recovered = self.pending.take();
        let hint = std::mem::take(&mut self.hint);
        self.buffer.clear();
        self.window.clear();

        let named = match recovered {
            Some((path, strategy)) => Some((path, Naming::Recovered(strategy))),
            None => self
                .namer
                .peek(&hint, |name| self.artifacts.contains(name))
                .map(|(path, ext)| (path, Naming::Default(ext))),
        };
        let Some((path, naming)) = named else {
            self.events.push(ParseEvent::Unnamed);
            return;
        };

        if content.trim().is_empty() {
            self.events.push(ParseEvent::EmptyBlock);
            return;
        }

        // Every emitted artifact advances its extension's counter
        let origin = match naming {
            Naming::Default(ext) => {
                self.namer.commit(&ext);
                PathOrigin::Default
            }
            Naming::Recovered(strategy) => {
                self.namer.commit(&language_extension(&extension_of(&path)));
                PathOrigin::Recovered(strategy)
            }
        };

        let content = content.trim_end().to_string();
        let bytes = content.len();
        let artifact = ParsedArtifact::new(path.clone(), content, origin);

        debug!(path = %path, bytes, "artifact recovered");
        self.events.push(ParseEvent::Recovered {
            path: path.clone(),
            bytes,
        });
        if self.artifacts.upsert(artifact) == Upsert::Replaced {
            debug!(path = %path, "artifact replaced");
            self.events.push(ParseEvent::Replaced { path });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[&str]) -> ParseState {
        lines
            .iter()
            .fold(ParseState::default(), |state, line| state.step(line))
    }

    #[test]
    fn test_outside_prose_fills_window_and_drops_oldest() {
        let state = run(&["1", "2", "3", "4", "5", "6", "7"]);
        assert!(!state.in_block());
        assert_eq!(state.window().len(), WINDOW_SIZE);
        assert_eq!(state.window().front().map(String::as_str), Some("3"));
    }

    #[test]
    fn test_outside_marker_sets_pending() {
        let state = run(&["FILE: app.py"]);
        assert_eq!(state.pending(), Some("app.py"));
    }

    #[test]
    fn test_later_heading_overrides_pending() {
        let state = run(&["FILE: a.py", "FILE: b.py"]);
        assert_eq!(state.pending(), Some("b.py"));
    }

    #[test]
    fn test_open_fence_enters_block_with_hint() {
        let state = run(&["```rust extra"]);
        assert!(state.in_block());
        assert_eq!(state.hint, "rust");
    }

    #[test]
    fn test_hint_stops_at_first_whitespace() {
        let state = run(&["``` python"]);
        assert!(state.in_block());
        assert!(state.hint.is_empty());

        let outcome = run(&["``` python", "print(1)", "```"]).finish();
        assert!(outcome.artifacts.is_empty());
        assert_eq!(outcome.events, vec![ParseEvent::Unnamed]);
    }

    #[test]
    fn test_open_fence_uses_window_when_nothing_pending() {
        let state = run(&["I wrote lib/util.go for you:", "```go"]);
        assert_eq!(state.pending(), Some("lib/util.go"));
    }

    #[test]
    fn test_inside_lines_accumulate_and_are_not_windowed() {
        let state = run(&["```", "FILE: inner.txt", "x"]);
        assert!(state.in_block());
        assert_eq!(state.buffer, vec!["FILE: inner.txt", "x"]);
        assert!(state.window().is_empty());
        assert_eq!(state.pending(), None);
    }

    #[test]
    fn test_close_resets_scanner_state() {
        let state = run(&["intro", "FILE: a.txt", "```text", "body", "```"]);
        assert!(!state.in_block());
        assert_eq!(state.pending(), None);
        assert!(state.window().is_empty());
        assert!(state.hint.is_empty());
        assert!(state.buffer.is_empty());
        assert_eq!(state.artifacts.len(), 1);
    }

    #[test]
    fn test_unnamed_block_records_event() {
        let outcome = run(&["```", "x", "```"]).finish();
        assert!(outcome.artifacts.is_empty());
        assert_eq!(outcome.events, vec![ParseEvent::Unnamed]);
    }

    #[test]
    fn test_event_display() {
        let event = ParseEvent::Recovered {
            path: "a.txt".to_string(),
            bytes: 3,
        };
        assert_eq!(event.to_string(), "[Parser] Found file: a.txt (3 bytes)");
    }
}
