//! Write-and-verify stage
//!
//! Each artifact is written through the [`FileStore`], read back, and
//! classified. A failing artifact never stops the batch.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::parse::ParsedArtifact;
use crate::workspace::FileStore;

/// How one write ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WriteOutcome {
    /// Read-back matched the intended content
    Created,
    /// Intended content equals what was already there
    UnchangedWarning,
    /// Read-back was empty although content was not
    VerifyFailedEmpty,
    /// Read-back differs but is not empty
    VerifyPartial { written: usize, read_back: usize },
    /// The store refused or failed the write
    WriteFailed { error: String },
}

impl WriteOutcome {
    /// Whether this outcome fails the batch.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::VerifyFailedEmpty | Self::WriteFailed { .. })
    }

    /// Whether the store reported the write as done.
    #[must_use]
    pub fn was_written(&self) -> bool {
        !matches!(self, Self::WriteFailed { .. })
    }
}

/// Outcome for one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteRecord {
    pub path: String,
    pub outcome: WriteOutcome,
    /// The path held a file before this write
    pub existed_before: bool,
}

impl WriteRecord {
    /// Human-readable line for the status channel.
    #[must_use]
    pub fn status_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WriteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = &self.path;
        match &self.outcome {
            WriteOutcome::Created if self.existed_before => write!(f, "  [+] Updated: {path}"),
            WriteOutcome::Created => write!(f, "  [+] Created: {path}"),
            WriteOutcome::UnchangedWarning => {
                write!(f, "  [=] Unchanged: {path} (content identical to existing file)")
            }
            WriteOutcome::VerifyFailedEmpty => {
                write!(f, "  [!] Verify failed: {path} is empty after write")
            }
            WriteOutcome::VerifyPartial { written, read_back } => write!(
                f,
                "  [?] Verify mismatch: {path} (wrote {written} bytes, read back {read_back})"
            ),
            WriteOutcome::WriteFailed { error } => {
                write!(f, "  [!] Failed to create: {path} - {error}")
            }
        }
    }
}

/// Everything one batch produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaterializeReport {
    /// One record per artifact, in parse order
    pub records: Vec<WriteRecord>,
    /// Paths the store reported as written, whatever verification said
    pub created_files: Vec<String>,
}

impl MaterializeReport {
    /// No artifact failed to write or verified empty.
    #[must_use]
    pub fn success(&self) -> bool {
        !self.records.iter().any(|r| r.outcome.is_failure())
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_failure()).count()
    }

    #[must_use]
    pub fn count(&self, pred: impl Fn(&WriteOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Write one artifact and classify the result.
pub fn write_artifact(store: &dyn FileStore, artifact: &ParsedArtifact) -> WriteRecord {
    let path = artifact.path.as_str();
    let existed_before = store.file_exists(path);
    let prior = store.read_file(path);

    let outcome = match store.create_file(path, &artifact.content) {
        Err(e) => {
            warn!(path, error = %e, "write failed");
            WriteOutcome::WriteFailed {
                error: e.to_string(),
            }
        }
        Ok(()) => verify(store, artifact, existed_before && prior == artifact.content),
    };

    debug!(path, outcome = ?outcome, "artifact materialized");
    WriteRecord {
        path: artifact.path.clone(),
        outcome,
        existed_before,
    }
}

fn verify(store: &dyn FileStore, artifact: &ParsedArtifact, unchanged: bool) -> WriteOutcome {
    let read_back = store.read_file(&artifact.path);
    if read_back == artifact.content {
        if unchanged {
            WriteOutcome::UnchangedWarning
        } else {
            WriteOutcome::Created
        }
    } else if read_back.is_empty() && !artifact.content.is_empty() {
        warn!(path = %artifact.path, "file empty after write");
        WriteOutcome::VerifyFailedEmpty
    } else {
        warn!(path = %artifact.path, "read-back differs from written content");
        WriteOutcome::VerifyPartial {
            written: artifact.content.len(),
            read_back: read_back.len(),
        }
    }
}

/// Write every artifact in order.
pub fn materialize(store: &dyn FileStore, artifacts: &[ParsedArtifact]) -> MaterializeReport {
    materialize_with(store, artifacts, |_| {})
}

/// [`materialize`], calling `on_record` as each artifact finishes.
pub fn materialize_with(
    store: &dyn FileStore,
    artifacts: &[ParsedArtifact],
    mut on_record: impl FnMut(&WriteRecord),
) -> MaterializeReport {
    let mut report = MaterializeReport::default();
    for artifact in artifacts {
        let record = write_artifact(store, artifact);
        on_record(&record);
        if record.outcome.was_written() {
            report.created_files.push(record.path.clone());
        }
        report.records.push(record);
    }
    report
}
