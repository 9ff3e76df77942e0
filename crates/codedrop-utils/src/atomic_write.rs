//! Atomic file writes: temp file in the target directory, fsync, rename
//!
//! Content is written byte-for-byte. Callers verify writes by reading the
//! file back, so nothing here may rewrite line endings or encoding.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

#[cfg(target_os = "windows")]
use std::{thread, time::Duration};

/// Details about a completed atomic write
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteResult {
    /// Rename retries caused by transient locks (Windows only)
    pub rename_retry_count: u32,
    pub bytes_written: usize,
    pub warnings: Vec<String>,
}

/// Write `content` to `path`, creating parent directories as needed.
///
/// Readers either see the previous file or the complete new one.
pub fn write_file_atomic(path: &Path, content: &str) -> Result<AtomicWriteResult> {
    let mut result = AtomicWriteResult::default();

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create parent directory: {}", parent.display()))?;

    let mut temp_file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in: {}", parent.display()))?;

    temp_file
        .write_all(content.as_bytes())
        .context("Failed to write content to temporary file")?;
    temp_file
        .as_file()
        .sync_all()
        .context("Failed to fsync temporary file")?;
    result.bytes_written = content.len();

    let retry_count = atomic_rename(temp_file, path)
        .with_context(|| format!("Failed to atomically write file: {}", path.display()))?;
    result.rename_retry_count = retry_count;
    if retry_count > 0 {
        result.warnings.push(format!(
            "Rename required {retry_count} retries due to transient filesystem locks"
        ));
    }

    Ok(result)
}

/// Rename with bounded exponential backoff (10ms doubling, at most 250ms total).
#[cfg(target_os = "windows")]
fn atomic_rename(mut temp_file: NamedTempFile, target: &Path) -> Result<u32> {
    use std::io::ErrorKind;

    const MAX_RETRIES: u32 = 5;
    const INITIAL_DELAY_MS: u64 = 10;
    const MAX_TOTAL_DELAY_MS: u64 = 250;

    let mut retry_count = 0;
    let mut total_delay_ms = 0;

    loop {
        match temp_file.persist(target) {
            Ok(_) => return Ok(retry_count),
            Err(persist_error) => {
                let retryable = matches!(
                    persist_error.error.kind(),
                    ErrorKind::PermissionDenied | ErrorKind::Other
                );
                let delay_ms = INITIAL_DELAY_MS * 2_u64.pow(retry_count);
                if !retryable
                    || retry_count >= MAX_RETRIES
                    || total_delay_ms + delay_ms > MAX_TOTAL_DELAY_MS
                {
                    return Err(anyhow::anyhow!(persist_error.error));
                }

                thread::sleep(Duration::from_millis(delay_ms));
                total_delay_ms += delay_ms;
                retry_count += 1;
                temp_file = persist_error.file;
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn atomic_rename(temp_file: NamedTempFile, target: &Path) -> Result<u32> {
    temp_file
        .persist(target)
        .map(|_| 0)
        .map_err(|e| anyhow::anyhow!(e.error))
}
