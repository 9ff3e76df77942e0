//! Named filename matchers, tried in a fixed priority order

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::filename::{clean_candidate, is_plausible_filename};

/// A line that points at a file, e.g. `Updated src/app.py:`
static BARE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-zA-Z0-9_\-./]+\.[a-zA-Z0-9]{1,5})").unwrap());

/// Lines at or above this length are prose, not a filename heading
pub const MAX_HEADING_LINE_CHARS: usize = 100;

/// How a filename was recovered from prose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// `FILE: name.ext` anywhere in the line
    FileMarker,
    /// The whole line, minus decoration, is a filename
    CleanedLine,
    /// First `name.ext`-shaped token in the line
    BareToken,
}

impl MatchStrategy {
    /// Order used when looking back from an opening fence
    pub const LOOKBACK_ORDER: [MatchStrategy; 3] = [
        MatchStrategy::FileMarker,
        MatchStrategy::CleanedLine,
        MatchStrategy::BareToken,
    ];

    /// Order used on each prose line as it is scanned
    pub const HEADING_ORDER: [MatchStrategy; 2] =
        [MatchStrategy::FileMarker, MatchStrategy::CleanedLine];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::FileMarker => "file_marker",
            Self::CleanedLine => "cleaned_line",
            Self::BareToken => "bare_token",
        }
    }

    /// Candidate filename from `line`, already validated.
    #[must_use]
    pub fn apply(self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let candidate = match self {
            Self::FileMarker => file_marker(line)?,
            Self::CleanedLine => clean_candidate(line),
            Self::BareToken => BARE_TOKEN
                .captures(line)?
                .get(1)?
                .as_str()
                .to_string(),
        };
        is_plausible_filename(&candidate).then_some(candidate)
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Text after the first `:` of a line that carries a `FILE:` label.
fn file_marker(line: &str) -> Option<String> {
    let upper = line.to_ascii_uppercase();
    if !(upper.contains("FILE:") || upper.contains("FILE :")) {
        return None;
    }
    let (_, after) = line.split_once(':')?;
    Some(clean_candidate(after))
}

/// First strategy in `order` that yields a filename for `line`.
#[must_use]
pub fn first_match(order: &[MatchStrategy], line: &str) -> Option<(String, MatchStrategy)> {
    order
        .iter()
        .find_map(|s| s.apply(line).map(|name| (name, *s)))
}

/// Filename to hold as pending for a prose line.
///
/// A cleaned-line match only applies to short lines.
#[must_use]
pub fn heading_candidate(line: &str) -> Option<(String, MatchStrategy)> {
    if let Some(name) = MatchStrategy::FileMarker.apply(line) {
        return Some((name, MatchStrategy::FileMarker));
    }
    if line.chars().count() < MAX_HEADING_LINE_CHARS {
        return MatchStrategy::CleanedLine
            .apply(line)
            .map(|name| (name, MatchStrategy::CleanedLine));
    }
    None
}

/// Search recent lines, newest first, for a filename.
#[must_use]
pub fn lookback_candidate<'a, I>(recent_newest_first: I) -> Option<(String, MatchStrategy)>
where
    I: IntoIterator<Item = &'a String>,
{
    recent_newest_first
        .into_iter()
        .find_map(|line| first_match(&MatchStrategy::LOOKBACK_ORDER, line))
}
