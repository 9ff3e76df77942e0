//! Keyword check of the request against what was produced
//!
//! Advisory only. Nothing here changes a request's success.

use std::fmt;

use serde::Serialize;

/// Printed after any warning
pub const INSTRUCTIONS_NOTICE: &str = "[!] The model may not have followed all instructions. \
Try rephrasing the request or switching to a more capable model with /model.";

const STYLE_STEM: &str = "styl";

/// Raw signals the warnings are derived from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditSignals {
    pub expected_css: bool,
    pub expected_new_pages: bool,
    pub expected_nav: bool,
    pub has_css: bool,
    pub html_count: usize,
}

impl AuditSignals {
    #[must_use]
    pub fn collect<S: AsRef<str>>(request: &str, paths: &[S]) -> Self {
        let request = request.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| request.contains(w));

        Self {
            // Stem so "styling" and "stylesheet" count
            expected_css: mentions(&["css", STYLE_STEM]),
            expected_new_pages: mentions(&["page"]) && mentions(&["new", "create", "add"]),
            expected_nav: mentions(&["nav", "menu", "link"]),
            has_css: paths.iter().any(|p| p.as_ref().contains(".css")),
            html_count: paths
                .iter()
                .filter(|p| {
                    let p = p.as_ref();
                    p.contains(".html") || p.contains(".htm")
                })
                .count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditWarning {
    /// Styling asked for, no stylesheet produced
    MissingCss,
    /// New pages asked for, at most one HTML file produced
    MissingNewPages,
}

impl fmt::Display for AuditWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCss => write!(
                f,
                "[!] Warning: styling was requested but no CSS file was created"
            ),
            Self::MissingNewPages => write!(
                f,
                "[!] Warning: new pages were requested but at most one HTML file was created"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub signals: AuditSignals,
    pub warnings: Vec<AuditWarning>,
}

impl AuditReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// The follow-up notice, when any warning fired.
    #[must_use]
    pub fn notice(&self) -> Option<&'static str> {
        (!self.is_clean()).then_some(INSTRUCTIONS_NOTICE)
    }

    /// Warning lines then the notice.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.warnings.iter().map(ToString::to_string).collect();
        lines.extend(self.notice().map(str::to_string));
        lines
    }
}

/// Compare the request with the produced paths.
#[must_use]
pub fn audit<S: AsRef<str>>(request: &str, produced: &[S]) -> AuditReport {
    let signals = AuditSignals::collect(request, produced);
    let mut warnings = Vec::new();

    if signals.expected_css && !signals.has_css {
        warnings.push(AuditWarning::MissingCss);
    }
    if signals.expected_new_pages && signals.html_count <= 1 {
        warnings.push(AuditWarning::MissingNewPages);
    }

    AuditReport { signals, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_page_with_styling_only_index_warns_twice() {
        let report = audit("add a new page with navigation and styling", &["index.html"]);
        assert_eq!(
            report.warnings,
            vec![AuditWarning::MissingCss, AuditWarning::MissingNewPages]
        );
        assert!(report.signals.expected_nav);
        assert_eq!(report.notice(), Some(INSTRUCTIONS_NOTICE));
        assert_eq!(report.lines().len(), 3);
    }

    #[test]
    fn test_satisfied_request_is_clean() {
        let report = audit(
            "Create a new About PAGE with CSS",
            &["index.html", "about.html", "styles.css"],
        );
        assert!(report.is_clean());
        assert_eq!(report.notice(), None);
        assert!(report.lines().is_empty());
    }

    #[test]
    fn test_page_without_verb_does_not_expect_pages() {
        let signals = AuditSignals::collect("fix the page title", &["index.html"]);
        assert!(!signals.expected_new_pages);
        assert!(!signals.expected_css);
    }

    #[test]
    fn test_htm_counts_as_html() {
        let signals = AuditSignals::collect("", &["a.htm", "b.html", "c.css"]);
        assert_eq!(signals.html_count, 2);
        assert!(signals.has_css);
    }

    #[test]
    fn test_style_stem_matches_inflections() {
        for request in ["add some style", "better styling", "a dark stylesheet"] {
            assert!(AuditSignals::collect(request, &["a.js"]).expected_css, "{request}");
        }
    }

    #[test]
    fn test_nav_alone_never_warns() {
        assert!(audit("add a menu link", &["script.js"]).is_clean());
    }

    #[test]
    fn test_empty_output_with_style_request() {
        let none: [&str; 0] = [];
        assert_eq!(audit("make it stylish", &none).warnings, vec![AuditWarning::MissingCss]);
    }
}
