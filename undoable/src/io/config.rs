//! Project configuration stored under `.undoable/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use super::atomic::write_atomic;

/// Project configuration (TOML).
///
/// Edited by humans; missing fields fall back to defaults. Relative paths are
/// resolved against the project directory, not the process working directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ProjectConfig {
    pub apply: ApplyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApplyConfig {
    /// Directory the change set paths are relative to.
    pub output_dir: PathBuf,

    /// Change set file read by `undoable apply` when `--changes` is not given.
    pub changes: PathBuf,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            changes: PathBuf::from(".undoable/changes.json"),
        }
    }
}

impl ProjectConfig {
    pub fn validate(&self) -> Result<()> {
        if self.apply.output_dir.as_os_str().is_empty() {
            return Err(anyhow!("apply.output_dir must not be empty"));
        }
        if self.apply.changes.as_os_str().is_empty() {
            return Err(anyhow!("apply.changes must not be empty"));
        }
        Ok(())
    }

    /// `apply.output_dir` resolved against `project_dir`.
    pub fn output_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.apply.output_dir)
    }

    /// `apply.changes` resolved against `project_dir`.
    pub fn changes_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.apply.changes)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ProjectConfig::default()`.
pub fn load_config(path: &Path) -> Result<ProjectConfig> {
    if !path.exists() {
        let cfg = ProjectConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ProjectConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ProjectConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf).with_context(|| format!("write config {}", path.display()))
}
