//! Orchestration for `undoable apply`: run the applier, then record the
//! inverse in the project's revert ledger.

use std::fs;
use std::path::Path;

use tracing::{error, info, instrument};

use crate::core::selection::Selection;
use crate::core::summary::BatchSummary;
use crate::core::types::{ApplyResult, ChangeSet};
use crate::error::EngineError;
use crate::io::applier::apply_change_set;
use crate::io::ledger::{Ledger, Session, change_set_digest, new_session_id};

/// Outcome of one apply call.
#[derive(Debug)]
pub struct ApplyReport {
    /// Session recorded in the ledger; `None` if nothing was mutated and the
    /// previous ledger slot was left as it was, or if saving failed.
    pub session_id: Option<String>,
    pub results: Vec<ApplyResult>,
    pub inverse: ChangeSet,
    pub summary: BatchSummary,
    /// The tree was mutated but its inverse could not be saved. `inverse` is
    /// then the only record of how to undo this call.
    pub ledger_error: Option<EngineError>,
}

/// Apply the selected changes under `root` and save their inverse.
///
/// Per-file failures do not stop the batch and still leave the session
/// applied: the ledger records the inverse of exactly the subset that
/// succeeded. A failed ledger save after the tree was mutated is reported in
/// `ledger_error` alongside the results, never in place of them.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn run_apply(
    root: &Path,
    change_set: &ChangeSet,
    selection: &Selection,
) -> Result<ApplyReport, EngineError> {
    let digest = change_set_digest(change_set)?;
    let outcome = apply_change_set(root, change_set, selection)?;
    let summary = BatchSummary::from_results(&outcome.results);

    let mut session_id = None;
    let mut ledger_error = None;
    if outcome.inverse.is_empty() {
        info!(%summary, "nothing mutated; ledger left unchanged");
    } else {
        let id = new_session_id();
        let target_root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let session = Session::new(id.clone(), target_root, outcome.inverse.clone())
            .with_source_digest(digest);
        match Ledger::for_root(root).save(&session) {
            Ok(()) => {
                info!(session = %id, %summary, "apply recorded");
                session_id = Some(id);
            }
            Err(err) => {
                error!(error = %err, %summary, "tree mutated but revert data was not saved");
                ledger_error = Some(err);
            }
        }
    }

    Ok(ApplyReport {
        session_id,
        results: outcome.results,
        inverse: outcome.inverse,
        summary,
        ledger_error,
    })
}
