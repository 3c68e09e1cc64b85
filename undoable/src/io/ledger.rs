//! Revert ledger: the single persisted slot holding the inverse of the most
//! recent apply (`.undoable/revert.json`).
//!
//! The record's `changes` array uses the change set wire format, so a ledger
//! validates against the same schema as any change set and can be fed back to
//! `undoable apply --changes`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::core::path::CONTROL_DIR;
use crate::core::types::{ChangeSet, FileChange};
use crate::error::EngineError;
use crate::io::atomic::write_atomic;
use crate::io::change_set_store::parse_validated;

pub const LEDGER_FILE: &str = "revert.json";

/// One applied session: the inverse of what it changed under `target_root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub target_root: PathBuf,
    pub inverse: ChangeSet,
    /// RFC 3339 timestamp of the save.
    pub saved_at: String,
    /// Hex SHA-256 of the change set that produced this inverse.
    pub source_digest: Option<String>,
}

impl Session {
    pub fn new(id: impl Into<String>, target_root: impl Into<PathBuf>, inverse: ChangeSet) -> Self {
        Self {
            id: id.into(),
            target_root: target_root.into(),
            inverse,
            saved_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            source_digest: None,
        }
    }

    pub fn with_source_digest(mut self, digest: impl Into<String>) -> Self {
        self.source_digest = Some(digest.into());
        self
    }
}

/// On-disk shape of the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerRecord {
    session_id: String,
    target_root: String,
    saved_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    changes: Vec<FileChange>,
}

impl From<&Session> for LedgerRecord {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            target_root: session.target_root.display().to_string(),
            saved_at: session.saved_at.clone(),
            source_digest: session.source_digest.clone(),
            summary: session.inverse.summary.clone(),
            changes: session.inverse.changes.clone(),
        }
    }
}

impl From<LedgerRecord> for Session {
    fn from(record: LedgerRecord) -> Self {
        Self {
            id: record.session_id,
            target_root: PathBuf::from(record.target_root),
            inverse: ChangeSet {
                summary: record.summary,
                changes: record.changes,
            },
            saved_at: record.saved_at,
            source_digest: record.source_digest,
        }
    }
}

/// Ledger slot for one project root.
#[derive(Debug, Clone)]
pub struct Ledger {
    root: PathBuf,
    path: PathBuf,
}

impl Ledger {
    /// The ledger of the project rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let path = root.join(CONTROL_DIR).join(LEDGER_FILE);
        Self { root, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Overwrite the slot with `session` (temp file + rename).
    pub fn save(&self, session: &Session) -> Result<(), EngineError> {
        debug!(path = %self.path.display(), session = %session.id, changes = session.inverse.len(), "saving ledger");
        let record = LedgerRecord::from(session);
        let mut buf = serde_json::to_string_pretty(&record)
            .map_err(|err| EngineError::io("serialize ledger", err.into()))?;
        buf.push('\n');
        write_atomic(&self.path, &buf)
            .map_err(|err| EngineError::io(format!("write ledger {}", self.path.display()), err))?;
        info!(session = %session.id, changes = session.inverse.len(), "ledger saved");
        Ok(())
    }

    /// Load the slot. With `Some(id)`, a slot holding a different session is
    /// reported as not found.
    pub fn load(&self, session_id: Option<&str>) -> Result<Session, EngineError> {
        debug!(path = %self.path.display(), session = ?session_id, "loading ledger");
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(self.not_found()),
            Err(err) => {
                return Err(EngineError::io(
                    format!("read ledger {}", self.path.display()),
                    err,
                ));
            }
        };
        let record: LedgerRecord = parse_validated(&self.path.display().to_string(), &raw)?;
        if let Some(expected) = session_id {
            if record.session_id != expected {
                debug!(expected, found = %record.session_id, "ledger holds another session");
                return Err(self.not_found());
            }
        }
        Ok(record.into())
    }

    /// Remove the slot. Returns whether anything was removed.
    pub fn clear(&self) -> Result<bool, EngineError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "ledger cleared");
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(EngineError::io(
                format!("remove ledger {}", self.path.display()),
                err,
            )),
        }
    }

    fn not_found(&self) -> EngineError {
        EngineError::LedgerNotFound {
            root: self.root.clone(),
        }
    }
}

/// New session id: `apply-<utc timestamp>-<6 lowercase alphanumerics>`.
pub fn new_session_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let mut rng = rand::thread_rng();
    let suffix = std::iter::repeat_with(|| rng.sample(Alphanumeric))
        .map(char::from)
        .take(6)
        .collect::<String>()
        .to_lowercase();
    format!("apply-{timestamp}-{suffix}")
}

/// Hex SHA-256 of the canonical JSON encoding of `change_set`.
pub fn change_set_digest(change_set: &ChangeSet) -> Result<String, EngineError> {
    let encoded = serde_json::to_vec(change_set)
        .map_err(|err| EngineError::io("serialize change set for digest", err.into()))?;
    Ok(hex::encode(Sha256::digest(&encoded)))
}
