//! Containment guard: proves a change path stays inside the target root.
//!
//! The candidate is resolved one component at a time starting from the
//! canonical root. Every component that exists as a symlink is replaced by its
//! canonical destination, so the running path is canonical at each step and
//! `..` can be applied by popping. Components that do not exist yet are
//! appended as-is; they cannot be links.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::core::path::{CONTROL_DIR, check_relative};
use crate::error::{EngineError, PathViolation};

/// Canonical target root, resolved once per batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    canonical: PathBuf,
}

impl Root {
    /// Canonicalize `root`. The root must exist and be a directory.
    pub fn open(root: &Path) -> Result<Self, EngineError> {
        let canonical = fs::canonicalize(root)
            .map_err(|err| EngineError::io(format!("resolve root {}", root.display()), err))?;
        if !canonical.is_dir() {
            return Err(EngineError::io(
                format!("resolve root {}", root.display()),
                io::Error::new(io::ErrorKind::NotADirectory, "target root is not a directory"),
            ));
        }
        Ok(Self { canonical })
    }

    pub fn path(&self) -> &Path {
        &self.canonical
    }

    /// `/`-separated path of `target` relative to the root, or `None` if
    /// `target` is not under it.
    pub fn relative(&self, target: &Path) -> Option<String> {
        let rel = target.strip_prefix(&self.canonical).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }

    /// Resolve `relative` against the root, or fail with `PathViolation`.
    ///
    /// The returned path is absolute and inside the root; if its final
    /// component was a symlink, it is the link's destination.
    pub fn check(&self, relative: &str) -> Result<PathBuf, PathViolation> {
        let violation = |reason: String| PathViolation {
            path: relative.to_string(),
            reason,
        };

        let rel = check_relative(relative).map_err(|err| violation(err.to_string()))?;
        let resolved = self.resolve(rel).map_err(violation)?;

        if !resolved.starts_with(&self.canonical) {
            warn!(path = relative, resolved = %resolved.display(), "blocked path outside root");
            return Err(violation(format!(
                "resolves to {} outside root {}",
                resolved.display(),
                self.canonical.display()
            )));
        }
        if resolved.starts_with(self.canonical.join(CONTROL_DIR)) {
            return Err(violation(format!(
                "resolves into the {CONTROL_DIR} control directory"
            )));
        }

        debug!(path = relative, resolved = %resolved.display(), "path contained");
        Ok(resolved)
    }

    fn resolve(&self, rel: &Path) -> Result<PathBuf, String> {
        let mut resolved = self.canonical.clone();
        for component in rel.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(name) => {
                    resolved.push(name);
                    if is_symlink(&resolved) {
                        resolved = fs::canonicalize(&resolved).map_err(|err| {
                            format!("cannot resolve symlink {}: {err}", resolved.display())
                        })?;
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err("absolute paths are not allowed".to_string());
                }
            }
        }
        Ok(resolved)
    }
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

/// One-shot form of [`Root::check`].
pub fn check(root: &Path, relative: &str) -> Result<PathBuf, EngineError> {
    Ok(Root::open(root)?.check(relative)?)
}
