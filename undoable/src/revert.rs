//! Orchestration for `undoable revert`.
//!
//! Revert re-drives the applier with the ledger's inverse change set. The
//! inverse of that run (the "redo" set) is returned to the caller but never
//! saved: a revert is a one-shot undo.
//!
//! Ledger bookkeeping after a revert: entries whose revert succeeded are
//! dropped from the slot; failed or unselected entries stay under the same
//! session id. Once no entries remain the slot is cleared, so a second full
//! revert reports `LedgerNotFound`.

use std::path::Path;

use tracing::{error, info, instrument, warn};

use crate::core::selection::Selection;
use crate::core::summary::BatchSummary;
use crate::core::types::{ApplyResult, ApplyStatus, ChangeSet, FileChange};
use crate::error::EngineError;
use crate::io::applier::apply_change_set;
use crate::io::ledger::{Ledger, Session};

/// Outcome of one revert call.
#[derive(Debug)]
pub struct RevertReport {
    pub session_id: String,
    pub results: Vec<ApplyResult>,
    /// Inverse of the revert itself; discarded by convention.
    pub inverse: ChangeSet,
    pub summary: BatchSummary,
    /// Ledger entries still pending after this call.
    pub remaining: usize,
    /// The tree was reverted but the ledger could not be updated to match.
    pub ledger_error: Option<EngineError>,
}

impl RevertReport {
    /// The ledger slot was emptied by this revert.
    pub fn ledger_cleared(&self) -> bool {
        self.remaining == 0 && self.ledger_error.is_none()
    }
}

/// Revert the selected ledger entries of `session_id` (or of whatever session
/// occupies the slot, when `None`).
#[instrument(skip_all, fields(root = %root.display(), session = ?session_id))]
pub fn run_revert(
    root: &Path,
    session_id: Option<&str>,
    selection: &Selection,
) -> Result<RevertReport, EngineError> {
    let ledger = Ledger::for_root(root);
    let session = ledger.load(session_id)?;
    info!(session = %session.id, entries = session.inverse.len(), "reverting");

    let outcome = apply_change_set(root, &session.inverse, selection)?;
    let summary = BatchSummary::from_results(&outcome.results);

    let remaining = pending_entries(&session.inverse, &outcome.results);
    let written = if remaining.is_empty() {
        ledger.clear().map(|_| ())
    } else {
        if summary.failure > 0 {
            warn!(failed = summary.failure, "some entries could not be reverted");
        }
        let kept = Session {
            inverse: ChangeSet {
                summary: session.inverse.summary.clone(),
                changes: remaining.clone(),
            },
            ..session.clone()
        };
        ledger.save(&kept)
    };
    let ledger_error = written.err();
    if let Some(err) = &ledger_error {
        error!(error = %err, "tree reverted but ledger was not updated");
    }
    info!(session = %session.id, %summary, remaining = remaining.len(), "revert finished");

    Ok(RevertReport {
        session_id: session.id,
        results: outcome.results,
        inverse: outcome.inverse,
        summary,
        remaining: remaining.len(),
        ledger_error,
    })
}

/// Ledger entries that did not revert successfully (failed or unselected).
fn pending_entries(inverse: &ChangeSet, results: &[ApplyResult]) -> Vec<FileChange> {
    inverse
        .changes
        .iter()
        .zip(results)
        .filter(|(_, result)| result.status != ApplyStatus::Success)
        .map(|(change, _)| change.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::run_apply;
    use crate::core::types::FailureKind;
    use std::fs;

    #[test]
    fn full_revert_restores_tree_and_clears_ledger() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        fs::write(root.join("calculator.py"), "X").expect("seed");
        let set = ChangeSet::new(vec![
            FileChange::replace("calculator.py", "Y"),
            FileChange::create("test_calculator.py", "Z"),
        ]);
        run_apply(root, &set, &Selection::All).expect("apply");

        let report = run_revert(root, None, &Selection::All).expect("revert");

        assert!(report.summary.is_clean());
        assert!(report.ledger_cleared());
        assert_eq!(
            fs::read_to_string(root.join("calculator.py")).expect("read"),
            "X"
        );
        assert!(!root.join("test_calculator.py").exists());
        assert!(matches!(
            run_revert(root, None, &Selection::All),
            Err(EngineError::LedgerNotFound { .. })
        ));
    }

    #[test]
    fn partial_revert_keeps_unselected_entries() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        let set = ChangeSet::new(vec![
            FileChange::create("a.txt", "a"),
            FileChange::create("b.txt", "b"),
        ]);
        let session_id = run_apply(root, &set, &Selection::All)
            .expect("apply")
            .session_id
            .expect("session");

        let report = run_revert(root, Some(&session_id), &Selection::paths(["a.txt"]))
            .expect("revert a");
        assert_eq!(report.remaining, 1);
        assert!(!root.join("a.txt").exists());
        assert!(root.join("b.txt").exists());

        let session = Ledger::for_root(root).load(Some(&session_id)).expect("ledger");
        assert_eq!(session.inverse.changes, vec![FileChange::delete("b.txt")]);

        let report = run_revert(root, Some(&session_id), &Selection::All).expect("revert b");
        assert!(report.ledger_cleared());
        assert!(!root.join("b.txt").exists());
    }

    #[test]
    fn failed_revert_entry_stays_in_ledger() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        let set = ChangeSet::new(vec![FileChange::create("a.txt", "a")]);
        let session_id = run_apply(root, &set, &Selection::All)
            .expect("apply")
            .session_id
            .expect("session");
        // A directory where the created file was makes its DELETE fail.
        fs::remove_file(root.join("a.txt")).expect("remove");
        fs::create_dir(root.join("a.txt")).expect("mkdir");

        let report = run_revert(root, None, &Selection::All).expect("revert");

        assert_eq!(report.summary.failure, 1);
        assert_eq!(report.results[0].failure, Some(FailureKind::Io));
        assert_eq!(report.remaining, 1);
        assert!(!report.ledger_cleared());
        let session = Ledger::for_root(root).load(Some(&session_id)).expect("ledger kept");
        assert_eq!(session.inverse.changes, vec![FileChange::delete("a.txt")]);
        assert!(root.join("a.txt").is_dir());
    }

    #[test]
    fn revert_without_apply_is_ledger_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = run_revert(temp.path(), None, &Selection::All).expect_err("nothing to revert");
        assert!(matches!(err, EngineError::LedgerNotFound { .. }));
    }

    #[test]
    fn revert_returns_redo_set_without_saving_it() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        let set = ChangeSet::new(vec![FileChange::create("new.txt", "hello")]);
        run_apply(root, &set, &Selection::All).expect("apply");

        let report = run_revert(root, None, &Selection::All).expect("revert");
        assert_eq!(
            report.inverse.changes,
            vec![FileChange::create("new.txt", "hello")]
        );
        assert!(!Ledger::for_root(root).exists());
    }
}
