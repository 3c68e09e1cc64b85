//! Shared change model for the apply/revert engine.
//!
//! A [`FileChange`] is a closed variant: CREATE and REPLACE always carry the
//! full file content, DELETE never does. The JSON wire shape
//! (`filePath`/`action`/`content`) is converted at the serde boundary so the
//! engine never checks whether content is present.

use serde::{Deserialize, Serialize};

/// Wire-level action name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Create,
    Replace,
    Delete,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeAction::Create => "CREATE",
            ChangeAction::Replace => "REPLACE",
            ChangeAction::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Operation performed on a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Write `content`, creating the file (and parents) if needed.
    Create { content: String },
    /// Overwrite the file with `content`.
    Replace { content: String },
    /// Remove the file if present.
    Delete,
}

/// One operation on one relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireChange", into = "WireChange")]
pub struct FileChange {
    pub path: String,
    pub op: Operation,
}

impl FileChange {
    pub fn create(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            op: Operation::Create {
                content: content.into(),
            },
        }
    }

    pub fn replace(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            op: Operation::Replace {
                content: content.into(),
            },
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            op: Operation::Delete,
        }
    }

    pub fn action(&self) -> ChangeAction {
        match self.op {
            Operation::Create { .. } => ChangeAction::Create,
            Operation::Replace { .. } => ChangeAction::Replace,
            Operation::Delete => ChangeAction::Delete,
        }
    }

    /// Content written by CREATE/REPLACE; `None` for DELETE.
    pub fn content(&self) -> Option<&str> {
        match &self.op {
            Operation::Create { content } | Operation::Replace { content } => Some(content),
            Operation::Delete => None,
        }
    }
}

/// JSON shape of a change entry. `content` is required by the schema even for
/// DELETE, where it is discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireChange {
    #[serde(rename = "filePath")]
    file_path: String,
    action: ChangeAction,
    #[serde(default)]
    content: String,
}

impl From<WireChange> for FileChange {
    fn from(wire: WireChange) -> Self {
        let op = match wire.action {
            ChangeAction::Create => Operation::Create {
                content: wire.content,
            },
            ChangeAction::Replace => Operation::Replace {
                content: wire.content,
            },
            ChangeAction::Delete => Operation::Delete,
        };
        Self {
            path: wire.file_path,
            op,
        }
    }
}

impl From<FileChange> for WireChange {
    fn from(change: FileChange) -> Self {
        let action = change.action();
        let content = match change.op {
            Operation::Create { content } | Operation::Replace { content } => content,
            Operation::Delete => String::new(),
        };
        Self {
            file_path: change.path,
            action,
            content,
        }
    }
}

/// Ordered batch of changes. Order is application order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub changes: Vec<FileChange>,
}

impl ChangeSet {
    pub fn new(changes: Vec<FileChange>) -> Self {
        Self {
            summary: None,
            changes,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

/// Per-change outcome status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplyStatus {
    Success,
    Failure,
    Skipped,
}

impl std::fmt::Display for ApplyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ApplyStatus::Success => "SUCCESS",
            ApplyStatus::Failure => "FAILURE",
            ApplyStatus::Skipped => "SKIPPED",
        };
        f.pad(label)
    }
}

/// Why a single change failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The path would resolve outside the target root.
    PathViolation,
    /// Reading, writing or deleting the target failed.
    Io,
}

/// Outcome for one change of a batch. Produced only by the applier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResult {
    #[serde(rename = "filePath")]
    pub path: String,
    pub action: ChangeAction,
    pub status: ApplyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl ApplyResult {
    pub fn success(change: &FileChange) -> Self {
        Self {
            path: change.path.clone(),
            action: change.action(),
            status: ApplyStatus::Success,
            reason: None,
            failure: None,
        }
    }

    pub fn skipped(change: &FileChange, reason: impl Into<String>) -> Self {
        Self {
            path: change.path.clone(),
            action: change.action(),
            status: ApplyStatus::Skipped,
            reason: Some(reason.into()),
            failure: None,
        }
    }

    pub fn failure(change: &FileChange, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            path: change.path.clone(),
            action: change.action(),
            status: ApplyStatus::Failure,
            reason: Some(reason.into()),
            failure: Some(kind),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_uses_file_path_and_uppercase_action() {
        let raw = r#"{"filePath":"src/lib.rs","action":"REPLACE","content":"fn main() {}"}"#;
        let change: FileChange = serde_json::from_str(raw).expect("parse");
        assert_eq!(change, FileChange::replace("src/lib.rs", "fn main() {}"));
    }

    #[test]
    fn delete_discards_content_and_serializes_empty() {
        let raw = r#"{"filePath":"old.txt","action":"DELETE","content":"ignored"}"#;
        let change: FileChange = serde_json::from_str(raw).expect("parse");
        assert_eq!(change.op, Operation::Delete);
        assert_eq!(change.content(), None);

        let value = serde_json::to_value(&change).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({"filePath": "old.txt", "action": "DELETE", "content": ""})
        );
    }

    #[test]
    fn change_set_omits_missing_summary() {
        let set = ChangeSet::new(vec![FileChange::create("a.txt", "a")]);
        let json = serde_json::to_string(&set).expect("serialize");
        assert_eq!(
            json,
            r#"{"changes":[{"filePath":"a.txt","action":"CREATE","content":"a"}]}"#
        );
    }

    #[test]
    fn failure_result_serializes_kind() {
        let change = FileChange::create("../x", "x");
        let result = ApplyResult::failure(&change, FailureKind::PathViolation, "path violation");
        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(value["status"], "FAILURE");
        assert_eq!(value["failure"], "path_violation");
        assert_eq!(value["filePath"], "../x");
    }
}
