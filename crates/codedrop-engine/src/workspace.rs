//! Filesystem collaborator
//!
//! [`FileStore`] is the seam the engine writes through. [`WorkspaceFs`] is
//! the disk implementation: every path goes through a [`SandboxRoot`], and
//! writes are atomic.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use codedrop_utils::atomic_write::write_file_atomic;
use codedrop_utils::error::WorkspaceError;
use codedrop_utils::paths::{LinkPolicy, SandboxPath, SandboxRoot};
use tracing::{debug, warn};

/// Relative-path file operations against one working directory.
///
/// Reads never fail: an absent or unreadable file reads as empty.
pub trait FileStore: Send + Sync {
    fn working_dir(&self) -> &Path;

    /// Write `content` at `rel`, creating parent directories.
    fn create_file(&self, rel: &str, content: &str) -> Result<(), WorkspaceError>;

    fn read_file(&self, rel: &str) -> String;

    fn file_exists(&self, rel: &str) -> bool;

    /// Remove a file. An absent file counts as removed.
    fn delete_file(&self, rel: &str) -> Result<(), WorkspaceError>;

    fn create_directory(&self, rel: &str) -> Result<(), WorkspaceError>;

    /// Sorted entry names of a directory; empty when it does not exist.
    fn list_files(&self, rel: &str) -> Vec<String>;

    /// Message of the most recent failed operation.
    fn last_error(&self) -> Option<String>;
}

/// Disk-backed [`FileStore`] confined to a sandbox root
#[derive(Debug)]
pub struct WorkspaceFs {
    root: SandboxRoot,
    last_error: Mutex<Option<String>>,
}

impl WorkspaceFs {
    /// Open `dir` as the working directory, creating it if missing.
    pub fn open(dir: impl AsRef<Path>, allow_links: bool) -> Result<Self, WorkspaceError> {
        let root = SandboxRoot::create(dir, LinkPolicy::from_allow_links(allow_links))?;
        debug!(root = %root.as_path().display(), "workspace opened");
        Ok(Self {
            root,
            last_error: Mutex::new(None),
        })
    }

    /// Switch to another working directory, keeping the link policy.
    pub fn set_working_dir(&mut self, dir: impl AsRef<Path>) -> Result<(), WorkspaceError> {
        self.root = SandboxRoot::create(dir, self.root.policy())?;
        Ok(())
    }

    fn resolve(&self, rel: &str) -> Result<SandboxPath, WorkspaceError> {
        self.root.join(rel).map_err(|e| self.record(e))
    }

    fn record(&self, err: WorkspaceError) -> WorkspaceError {
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = Some(err.to_string());
        }
        err
    }

    fn io_failure(&self, target: &SandboxPath, source: std::io::Error) -> WorkspaceError {
        self.record(WorkspaceError::Io {
            path: target.relative_slash(),
            source,
        })
    }

    fn full_path(&self, rel: &str) -> Option<PathBuf> {
        self.root.join(rel).ok().map(|p| p.as_path().to_path_buf())
    }
}

impl FileStore for WorkspaceFs {
    fn working_dir(&self) -> &Path {
        self.root.as_path()
    }

    fn create_file(&self, rel: &str, content: &str) -> Result<(), WorkspaceError> {
        let target = self.resolve(rel)?;
        match write_file_atomic(target.as_path(), content) {
            Ok(result) => {
                for warning in &result.warnings {
                    warn!(path = rel, "{warning}");
                }
                debug!(
                    path = rel,
                    bytes = result.bytes_written,
                    retries = result.rename_retry_count,
                    "file written"
                );
                Ok(())
            }
            Err(e) => Err(self.record(WorkspaceError::WriteFailed {
                path: target.relative_slash(),
                reason: format!("{e:#}"),
            })),
        }
    }

    fn read_file(&self, rel: &str) -> String {
        let Some(path) = self.full_path(rel) else {
            return String::new();
        };
        match std::fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        }
    }

    fn file_exists(&self, rel: &str) -> bool {
        self.full_path(rel).is_some_and(|p| p.exists())
    }

    fn delete_file(&self, rel: &str) -> Result<(), WorkspaceError> {
        let target = self.resolve(rel)?;
        match std::fs::remove_file(target.as_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_failure(&target, e)),
        }
    }

    fn create_directory(&self, rel: &str) -> Result<(), WorkspaceError> {
        let target = self.resolve(rel)?;
        std::fs::create_dir_all(target.as_path()).map_err(|e| self.io_failure(&target, e))
    }

    fn list_files(&self, rel: &str) -> Vec<String> {
        let dir = if rel.is_empty() || rel == "." {
            Some(self.root.as_path().to_path_buf())
        } else {
            self.full_path(rel)
        };
        let Some(entries) = dir.and_then(|d| std::fs::read_dir(d).ok()) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|slot| slot.clone())
    }
}
