//! Project layout and `.undoable/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::config::{ProjectConfig, write_config};
use super::ledger::LEDGER_FILE;
use crate::core::path::CONTROL_DIR;

/// All canonical paths within `.undoable/` for a project directory.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub control_dir: PathBuf,
    pub config_path: PathBuf,
    pub ledger_path: PathBuf,
    pub gitignore_path: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let control_dir = root.join(CONTROL_DIR);
        Self {
            root: root.clone(),
            control_dir: control_dir.clone(),
            config_path: control_dir.join("config.toml"),
            ledger_path: control_dir.join(LEDGER_FILE),
            gitignore_path: control_dir.join(".gitignore"),
        }
    }
}

/// Options for `init_project`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing config files. The ledger is never touched.
    pub force: bool,
}

/// Create `.undoable/` scaffolding in `root`.
///
/// Fails if `.undoable/config.toml` already exists unless `options.force` is set.
pub fn init_project(root: &Path, options: &InitOptions) -> Result<ProjectPaths> {
    let paths = ProjectPaths::new(root);
    if paths.control_dir.exists() && !paths.control_dir.is_dir() {
        return Err(anyhow!(
            "undoable init: {CONTROL_DIR} exists but is not a directory"
        ));
    }
    if paths.config_path.exists() && !options.force {
        return Err(anyhow!(
            "undoable init: {} already exists (use --force to overwrite)",
            paths.config_path.display()
        ));
    }

    fs::create_dir_all(&paths.control_dir)
        .with_context(|| format!("create directory {}", paths.control_dir.display()))?;
    write_config(&paths.config_path, &ProjectConfig::default())?;
    fs::write(&paths.gitignore_path, CONTROL_GITIGNORE)
        .with_context(|| format!("write file {}", paths.gitignore_path.display()))?;

    Ok(paths)
}

// Ledger and temp files are machine state; config stays tracked.
const CONTROL_GITIGNORE: &str = "revert.json\n*.tmp\n";
