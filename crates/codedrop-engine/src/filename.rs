//! Filename heuristics
//!
//! Models decorate filenames with markdown (`**index.html**`, `` `app.py` ``,
//! `### FILE: a.txt`). These functions strip that decoration and decide
//! whether what is left could be a relative path.

/// Longest accepted name part, before the extension
pub const MAX_NAME_LEN: usize = 100;

/// Longest accepted extension
pub const MAX_EXTENSION_LEN: usize = 5;

const DECORATION: [char; 3] = ['*', '`', '#'];

/// Strip markdown decoration and a leading `FILE:` label.
///
/// ```rust
/// use codedrop_engine::filename::clean_candidate;
///
/// assert_eq!(clean_candidate("**FILE: src/app.py**"), "src/app.py");
/// assert_eq!(clean_candidate("`styles.css`"), "styles.css");
/// assert_eq!(clean_candidate("file : notes.md"), "notes.md");
/// ```
#[must_use]
pub fn clean_candidate(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !DECORATION.contains(c)).collect();
    let head = stripped.trim_start();

    let upper = head.to_ascii_uppercase();
    let rest = if upper.starts_with("FILE:") || upper.starts_with("FILE :") {
        head.split_once(':').map_or(head, |(_, after)| after)
    } else {
        head
    };

    rest.trim().to_string()
}

/// Whether `text` has the shape of a relative path with an extension.
///
/// The extension after the last `.` must be 1 to 5 ASCII alphanumerics. The
/// part before it must be 1 to 100 characters of alphanumerics, `_`, `-`,
/// `/`, `\` or `.`.
#[must_use]
pub fn is_plausible_filename(text: &str) -> bool {
    let trimmed = text.trim();
    let Some((name, ext)) = trimmed.rsplit_once('.') else {
        return false;
    };

    if ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
        return false;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }

    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/' | '\\' | '.'))
}

/// Lower-cased suffix after the last `.`, empty when there is none.
#[must_use]
pub fn extension_of(path: &str) -> String {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}
