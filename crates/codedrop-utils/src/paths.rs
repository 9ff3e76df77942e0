//! Sandboxed path resolution for the output directory
//!
//! Every artifact path the parser recovers is model-controlled text. Before
//! anything touches the disk it goes through [`SandboxRoot::join`], which only
//! yields paths that stay under the output directory.

use std::path::{Component, Path, PathBuf};

use crate::error::WorkspaceError;

/// Number of hard links to a file.
///
/// A count above 1 means the file is reachable through another name. Errors
/// are treated by callers as "possibly linked".
#[cfg(unix)]
pub fn link_count(path: &Path) -> Result<u32, std::io::Error> {
    use std::os::unix::fs::MetadataExt;
    let metadata = path.metadata()?;
    Ok(u32::try_from(metadata.nlink()).unwrap_or(u32::MAX))
}

#[cfg(windows)]
pub fn link_count(path: &Path) -> Result<u32, std::io::Error> {
    use std::fs::File;
    use std::os::windows::io::AsRawHandle;
    use windows::Win32::Foundation::HANDLE;
    use windows::Win32::Storage::FileSystem::{
        BY_HANDLE_FILE_INFORMATION, GetFileInformationByHandle,
    };

    let file = File::open(path)?;
    let handle = HANDLE(file.as_raw_handle());
    let mut file_info = BY_HANDLE_FILE_INFORMATION::default();

    // SAFETY: `handle` is owned by `file`, which outlives the call.
    match unsafe { GetFileInformationByHandle(handle, &mut file_info) } {
        Ok(()) => Ok(file_info.nNumberOfLinks),
        Err(e) => Err(std::io::Error::other(format!(
            "GetFileInformationByHandle failed: {e}"
        ))),
    }
}

/// Which kinds of links may appear inside the output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkPolicy {
    pub allow_symlinks: bool,
    pub allow_hardlinks: bool,
}

impl LinkPolicy {
    /// Policy for the `allow_links` config switch.
    #[must_use]
    pub fn from_allow_links(allow_links: bool) -> Self {
        Self {
            allow_symlinks: allow_links,
            allow_hardlinks: allow_links,
        }
    }
}

/// Output directory that all generated files are confined to.
///
/// The root is canonicalized once at construction. Joined paths must be
/// relative, must not contain `..`, and must resolve under the root. Links
/// are rejected unless the [`LinkPolicy`] allows them.
///
/// ```rust,no_run
/// use codedrop_utils::paths::{LinkPolicy, SandboxRoot};
///
/// let root = SandboxRoot::create("./site", LinkPolicy::default())?;
/// let page = root.join("pages/about.html")?;
/// println!("{}", page.as_path().display());
/// # Ok::<(), codedrop_utils::error::WorkspaceError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SandboxRoot {
    root: PathBuf,
    policy: LinkPolicy,
}

impl SandboxRoot {
    /// Open an existing directory as the sandbox root.
    pub fn new(root: impl AsRef<Path>, policy: LinkPolicy) -> Result<Self, WorkspaceError> {
        let root_path = root.as_ref();
        let unavailable = |reason: String| WorkspaceError::RootUnavailable {
            path: root_path.display().to_string(),
            reason,
        };

        if !root_path.exists() {
            return Err(unavailable("does not exist".to_string()));
        }
        if !root_path.is_dir() {
            return Err(unavailable("not a directory".to_string()));
        }

        let canonical = root_path
            .canonicalize()
            .map_err(|e| unavailable(e.to_string()))?;

        // canonicalize() yields \\?\ paths on Windows
        #[cfg(windows)]
        let canonical = dunce::simplified(&canonical).to_path_buf();

        Ok(Self {
            root: canonical,
            policy,
        })
    }

    /// Create the directory (and parents) if missing, then open it.
    pub fn create(root: impl AsRef<Path>, policy: LinkPolicy) -> Result<Self, WorkspaceError> {
        let root_path = root.as_ref();
        if !root_path.exists() {
            std::fs::create_dir_all(root_path).map_err(|e| WorkspaceError::RootUnavailable {
                path: root_path.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        Self::new(root_path, policy)
    }

    /// Resolve a relative path inside the root.
    ///
    /// The path itself does not need to exist. When it does, its canonical
    /// form must still be under the root.
    pub fn join(&self, rel: impl AsRef<Path>) -> Result<SandboxPath, WorkspaceError> {
        let rel_path = rel.as_ref();
        let shown = || rel_path.display().to_string();

        if rel_path.is_absolute() || rel_path.has_root() {
            return Err(WorkspaceError::AbsolutePath { path: shown() });
        }
        if rel_path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(WorkspaceError::ParentDirEscape { path: shown() });
        }

        let full_path = self.root.join(rel_path);

        if !self.policy.allow_symlinks {
            self.reject_symlinks(rel_path)?;
        }

        if full_path.exists() {
            let canonical = canonical_or_escape(&full_path, &self.root, rel_path)?;
            if !canonical.starts_with(&self.root) {
                return Err(self.escape(rel_path));
            }
            if !self.policy.allow_hardlinks {
                reject_hardlink(&canonical, rel_path)?;
            }
            Ok(SandboxPath {
                full: canonical,
                rel: rel_path.to_path_buf(),
            })
        } else {
            // An allowed symlinked directory on the way could still point out
            if self.policy.allow_symlinks {
                self.check_nearest_ancestor(&full_path, rel_path)?;
            }
            Ok(SandboxPath {
                full: full_path,
                rel: rel_path.to_path_buf(),
            })
        }
    }

    /// Walk the components below the root and refuse any that is a symlink.
    fn reject_symlinks(&self, rel_path: &Path) -> Result<(), WorkspaceError> {
        let mut current = self.root.clone();
        for component in rel_path.components() {
            current.push(component);
            match current.symlink_metadata() {
                Ok(meta) if meta.file_type().is_symlink() => {
                    return Err(WorkspaceError::SymlinkNotAllowed {
                        path: rel_path.display().to_string(),
                    });
                }
                Ok(_) => {}
                // Nothing further down can exist
                Err(_) => break,
            }
        }
        Ok(())
    }

    fn check_nearest_ancestor(&self, full_path: &Path, rel_path: &Path) -> Result<(), WorkspaceError> {
        let mut ancestor = full_path.to_path_buf();
        while !ancestor.exists() {
            if !ancestor.pop() {
                return Ok(());
            }
        }
        let canonical = canonical_or_escape(&ancestor, &self.root, rel_path)?;
        if canonical.starts_with(&self.root) {
            Ok(())
        } else {
            Err(self.escape(rel_path))
        }
    }

    fn escape(&self, rel_path: &Path) -> WorkspaceError {
        WorkspaceError::OutsideRoot {
            path: rel_path.display().to_string(),
            root: self.root.display().to_string(),
        }
    }

    /// Canonical root directory.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn policy(&self) -> LinkPolicy {
        self.policy
    }
}

fn canonical_or_escape(path: &Path, root: &Path, rel_path: &Path) -> Result<PathBuf, WorkspaceError> {
    let canonical = path.canonicalize().map_err(|_| WorkspaceError::OutsideRoot {
        path: rel_path.display().to_string(),
        root: root.display().to_string(),
    })?;
    #[cfg(windows)]
    let canonical = dunce::simplified(&canonical).to_path_buf();
    Ok(canonical)
}

/// Regular files with more than one name are refused. Unknown counts too.
fn reject_hardlink(path: &Path, rel_path: &Path) -> Result<(), WorkspaceError> {
    if path.is_file() {
        match link_count(path) {
            Ok(1) => {}
            _ => {
                return Err(WorkspaceError::HardlinkNotAllowed {
                    path: rel_path.display().to_string(),
                });
            }
        }
    }
    Ok(())
}

/// A path resolved through [`SandboxRoot::join`]
#[derive(Debug, Clone)]
pub struct SandboxPath {
    full: PathBuf,
    rel: PathBuf,
}

impl SandboxPath {
    /// Absolute path for I/O.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.full
    }

    /// Relative path with `/` separators on every platform.
    #[must_use]
    pub fn relative_slash(&self) -> String {
        to_slash(&self.rel)
    }
}

impl AsRef<Path> for SandboxPath {
    fn as_ref(&self) -> &Path {
        &self.full
    }
}

/// Join normal components of a path with `/`.
fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
