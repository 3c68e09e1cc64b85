//! Test-only helpers for building project trees and inspecting them.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::path::CONTROL_DIR;

/// Throwaway project directory.
pub struct TestProject {
    _temp: TempDir,
    root: PathBuf,
}

impl TestProject {
    pub fn new() -> io::Result<Self> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().join("project");
        fs::create_dir_all(&root)?;
        Ok(Self { _temp: temp, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory next to the project root, used to prove nothing escapes.
    pub fn outside(&self) -> PathBuf {
        self.root
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone())
    }

    pub fn write(&self, rel: &str, contents: &str) -> io::Result<()> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    }

    pub fn read(&self, rel: &str) -> Option<String> {
        fs::read_to_string(self.root.join(rel)).ok()
    }

    /// Every file under the root (excluding `.undoable/`) keyed by its
    /// `/`-separated relative path.
    pub fn snapshot(&self) -> io::Result<BTreeMap<String, Vec<u8>>> {
        let mut files = BTreeMap::new();
        collect(&self.root, &self.root, &mut files)?;
        Ok(files)
    }
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<String, Vec<u8>>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if dir == root && entry.file_name() == CONTROL_DIR {
            continue;
        }
        if entry.file_type()?.is_dir() {
            collect(root, &path, files)?;
        } else {
            let rel = path
                .strip_prefix(root)
                .map_err(io::Error::other)?
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            files.insert(rel, fs::read(&path)?);
        }
    }
    Ok(())
}

/// Write a change set JSON file for CLI tests.
pub fn write_change_set_json(path: &Path, json: &serde_json::Value) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut buf = serde_json::to_string_pretty(json)?;
    buf.push('\n');
    fs::write(path, buf)
}
