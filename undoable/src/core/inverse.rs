//! Inverse derivation for applied changes.
//!
//! Pure: callers capture the target's prior state and report which resolved
//! target each change mutated; this module decides what undoes it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::core::types::{ChangeSet, FileChange, Operation};

/// State of a target immediately before a change touched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriorState {
    Absent,
    File(String),
}

/// The change that restores `prior` after `change` was applied successfully.
///
/// `target` is the root-relative path the change actually mutated, which
/// differs from `change.path` when the latter went through a symlink. The
/// inverse always addresses `target`.
///
/// `None` means the change did not mutate the tree (DELETE of an absent file).
pub fn inverse_of(target: &str, change: &FileChange, prior: &PriorState) -> Option<FileChange> {
    match (&change.op, prior) {
        (Operation::Create { .. } | Operation::Replace { .. }, PriorState::File(content)) => {
            Some(FileChange::replace(target, content.clone()))
        }
        (Operation::Create { .. } | Operation::Replace { .. }, PriorState::Absent) => {
            Some(FileChange::delete(target))
        }
        (Operation::Delete, PriorState::File(content)) => {
            Some(FileChange::create(target, content.clone()))
        }
        (Operation::Delete, PriorState::Absent) => None,
    }
}

/// Accumulates inverse entries in application order, keeping only the first
/// entry per resolved target: later changes to the same file in one batch
/// never saw the pre-batch state.
#[derive(Debug, Default)]
pub struct InverseBuilder {
    seen: BTreeSet<PathBuf>,
    changes: Vec<FileChange>,
}

impl InverseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `inverse` for `target`. Returns `false` if the target already has
    /// an entry and this one was dropped.
    pub fn record(&mut self, target: &Path, inverse: FileChange) -> bool {
        if !self.seen.insert(target.to_path_buf()) {
            return false;
        }
        self.changes.push(inverse);
        true
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn finish(self, summary: Option<String>) -> ChangeSet {
        ChangeSet {
            summary,
            changes: self.changes,
        }
    }
}

/// Summary stored with an inverse change set.
pub fn inverse_summary(original: Option<&str>) -> String {
    match original {
        Some(summary) if !summary.trim().is_empty() => format!("Revert: {}", summary.trim()),
        _ => "Revert data for the last apply operation.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_of_existing_file_inverts_to_replace_with_prior() {
        let change = FileChange::replace("calculator.py", "Y");
        let inverse = inverse_of(&change.path, &change, &PriorState::File("X".to_string()));
        assert_eq!(inverse, Some(FileChange::replace("calculator.py", "X")));
    }

    #[test]
    fn create_of_absent_file_inverts_to_delete() {
        let change = FileChange::create("test_calculator.py", "Z");
        let inverse = inverse_of(&change.path, &change, &PriorState::Absent);
        assert_eq!(inverse, Some(FileChange::delete("test_calculator.py")));
    }

    #[test]
    fn create_over_existing_file_inverts_to_replace() {
        let change = FileChange::create("a.txt", "new");
        let inverse = inverse_of(&change.path, &change, &PriorState::File("old".to_string()));
        assert_eq!(inverse, Some(FileChange::replace("a.txt", "old")));
    }

    #[test]
    fn delete_inverts_to_create_with_captured_content() {
        let change = FileChange::delete("gone.txt");
        let inverse = inverse_of(&change.path, &change, &PriorState::File("bye".to_string()));
        assert_eq!(inverse, Some(FileChange::create("gone.txt", "bye")));
    }

    #[test]
    fn delete_of_absent_file_has_no_inverse() {
        let change = FileChange::delete("never.txt");
        assert_eq!(inverse_of(&change.path, &change, &PriorState::Absent), None);
    }

    #[test]
    fn inverse_addresses_resolved_target_not_change_path() {
        let change = FileChange::delete("link.txt");
        let inverse = inverse_of("real.txt", &change, &PriorState::File("data".to_string()));
        assert_eq!(inverse, Some(FileChange::create("real.txt", "data")));
    }

    #[test]
    fn builder_keeps_first_entry_per_target() {
        let mut builder = InverseBuilder::new();
        let target = Path::new("/root/a.txt");
        assert!(builder.record(target, FileChange::replace("a.txt", "original")));
        assert!(!builder.record(target, FileChange::replace("a.txt", "intermediate")));
        assert!(builder.record(Path::new("/root/b.txt"), FileChange::delete("b.txt")));

        let set = builder.finish(None);
        assert_eq!(
            set.changes,
            vec![
                FileChange::replace("a.txt", "original"),
                FileChange::delete("b.txt"),
            ]
        );
    }

    #[test]
    fn summary_prefixes_original() {
        assert_eq!(inverse_summary(Some(" add tests ")), "Revert: add tests");
        assert_eq!(
            inverse_summary(None),
            "Revert data for the last apply operation."
        );
    }
}
