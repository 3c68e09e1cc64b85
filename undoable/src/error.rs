//! Error kinds surfaced by the apply/revert engine.
//!
//! Per-file problems (`PathViolation`, `Io`) are folded into that file's
//! `ApplyResult` and never abort a batch. The variants here are the ones that
//! reject a whole call: a malformed change set, an unusable root, or a revert
//! with nothing to revert.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::FailureKind;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Change set (or ledger) does not conform to the change set schema.
    #[error("schema violation in {source_name}:\n- {}", .messages.join("\n- "))]
    SchemaViolation {
        source_name: String,
        messages: Vec<String>,
    },

    /// A path resolved outside the target root.
    #[error("path violation for '{path}': {reason}")]
    PathViolation { path: String, reason: String },

    /// Filesystem operation failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Revert requested but no applied session is recorded for the root.
    #[error("no revert data found in {}; run `undoable apply` first", .root.display())]
    LedgerNotFound { root: PathBuf },
}

impl EngineError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        EngineError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn schema(source_name: impl Into<String>, messages: Vec<String>) -> Self {
        EngineError::SchemaViolation {
            source_name: source_name.into(),
            messages,
        }
    }
}

/// Containment guard rejection for one change path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("path violation for '{path}': {reason}")]
pub struct PathViolation {
    pub path: String,
    pub reason: String,
}

impl From<PathViolation> for EngineError {
    fn from(violation: PathViolation) -> Self {
        EngineError::PathViolation {
            path: violation.path,
            reason: violation.reason,
        }
    }
}

/// A single change's failure, recorded in its `ApplyResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl ChangeFailure {
    pub fn path_violation(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::PathViolation,
            reason: format!("path violation: {}", reason.into()),
        }
    }

    pub fn io(context: &str, err: &std::io::Error) -> Self {
        Self {
            kind: FailureKind::Io,
            reason: format!("{context}: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_violation_lists_every_message() {
        let err = EngineError::schema(
            "changes.json",
            vec!["missing filePath".to_string(), "bad action".to_string()],
        );
        assert_eq!(
            err.to_string(),
            "schema violation in changes.json:\n- missing filePath\n- bad action"
        );
    }

    #[test]
    fn path_violation_converts_into_engine_error() {
        let err = EngineError::from(PathViolation {
            path: "../x".to_string(),
            reason: "escapes root".to_string(),
        });
        assert_eq!(err.to_string(), "path violation for '../x': escapes root");
    }

    #[test]
    fn path_violation_reason_is_prefixed() {
        let failure = ChangeFailure::path_violation("escapes root");
        assert_eq!(failure.kind, FailureKind::PathViolation);
        assert_eq!(failure.reason, "path violation: escapes root");
    }
}
