//! Applier: executes a selected subset of a change set against a root.
//!
//! Best effort, not transactional: every selected change is attempted in
//! order and fails alone. The returned inverse only holds entries for changes
//! that succeeded and actually mutated the tree.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::core::inverse::{InverseBuilder, PriorState, inverse_of, inverse_summary};
use crate::core::selection::Selection;
use crate::core::types::{ApplyResult, ChangeAction, ChangeSet, FileChange, Operation};
use crate::error::{ChangeFailure, EngineError};
use crate::io::containment::Root;

/// Results in change-set order plus the inverse of what was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub results: Vec<ApplyResult>,
    pub inverse: ChangeSet,
}

/// What a preview found for one change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChange {
    pub index: usize,
    pub path: String,
    pub action: ChangeAction,
    pub selected: bool,
    /// `Err` holds the containment violation reason.
    pub target: Result<String, String>,
    pub exists: bool,
}

/// Apply the selected entries of `change_set` under `root`.
///
/// Fails as a whole only if the root itself cannot be resolved; every other
/// problem becomes that change's `FAILURE` result.
#[instrument(skip_all, fields(root = %root.display(), changes = change_set.len()))]
pub fn apply_change_set(
    root: &Path,
    change_set: &ChangeSet,
    selection: &Selection,
) -> Result<ApplyOutcome, EngineError> {
    let root = Root::open(root)?;
    let mut results = Vec::with_capacity(change_set.len());
    let mut inverse = InverseBuilder::new();

    for (index, change) in change_set.changes.iter().enumerate() {
        if !selection.is_selected(index, change) {
            debug!(index, path = %change.path, "not selected");
            results.push(ApplyResult::skipped(change, "not selected"));
            continue;
        }

        let target = match root.check(&change.path) {
            Ok(target) => target,
            Err(violation) => {
                let failure = ChangeFailure::path_violation(violation.reason);
                warn!(index, path = %change.path, reason = %failure.reason, "change rejected");
                results.push(ApplyResult::failure(change, failure.kind, failure.reason));
                continue;
            }
        };

        // Inverse entries address what was mutated, so a change made through
        // a symlink is undone on the link's destination.
        let relative = root
            .relative(&target)
            .unwrap_or_else(|| change.path.clone());

        match apply_one(&target, &relative, change) {
            Ok(Applied { inverse: inv, note }) => {
                if let Some(inv) = inv {
                    if !inverse.record(&target, inv) {
                        debug!(index, path = %change.path, "target already has an inverse entry");
                    }
                }
                debug!(index, path = %change.path, action = %change.action(), "change applied");
                let result = ApplyResult::success(change);
                results.push(match note {
                    Some(note) => result.with_reason(note),
                    None => result,
                });
            }
            Err(failure) => {
                warn!(index, path = %change.path, reason = %failure.reason, "change failed");
                results.push(ApplyResult::failure(change, failure.kind, failure.reason));
            }
        }
    }

    info!(
        results = results.len(),
        inverse = inverse.len(),
        "change set processed"
    );
    Ok(ApplyOutcome {
        results,
        inverse: inverse.finish(Some(inverse_summary(change_set.summary.as_deref()))),
    })
}

/// Report what `apply_change_set` would do, without touching the tree.
pub fn preview_change_set(
    root: &Path,
    change_set: &ChangeSet,
    selection: &Selection,
) -> Result<Vec<PlannedChange>, EngineError> {
    let root = Root::open(root)?;
    let planned = change_set
        .changes
        .iter()
        .enumerate()
        .map(|(index, change)| {
            let checked = root.check(&change.path);
            let exists = checked.as_ref().map(|p| p.is_file()).unwrap_or(false);
            PlannedChange {
                index,
                path: change.path.clone(),
                action: change.action(),
                selected: selection.is_selected(index, change),
                target: checked
                    .map(|p| p.display().to_string())
                    .map_err(|err| err.to_string()),
                exists,
            }
        })
        .collect();
    Ok(planned)
}

struct Applied {
    inverse: Option<FileChange>,
    note: Option<String>,
}

fn apply_one(target: &Path, relative: &str, change: &FileChange) -> Result<Applied, ChangeFailure> {
    // Capture first: if the prior state cannot be read exactly, nothing is
    // written, since the inverse would be wrong.
    let prior = capture_prior(target)?;

    match &change.op {
        Operation::Create { content } | Operation::Replace { content } => {
            write_file(target, content)?;
            Ok(Applied {
                inverse: inverse_of(relative, change, &prior),
                note: None,
            })
        }
        Operation::Delete => {
            if prior == PriorState::Absent {
                return Ok(Applied {
                    inverse: None,
                    note: Some("file not found; nothing to delete".to_string()),
                });
            }
            fs::remove_file(target).map_err(|err| ChangeFailure::io("delete file", &err))?;
            Ok(Applied {
                inverse: inverse_of(relative, change, &prior),
                note: None,
            })
        }
    }
}

fn capture_prior(target: &Path) -> Result<PriorState, ChangeFailure> {
    match fs::read(target) {
        Ok(bytes) => String::from_utf8(bytes).map(PriorState::File).map_err(|_| {
            ChangeFailure::io(
                "capture prior content",
                &std::io::Error::new(ErrorKind::InvalidData, "existing file is not valid UTF-8"),
            )
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(PriorState::Absent),
        Err(err) => Err(ChangeFailure::io("capture prior content", &err)),
    }
}

fn write_file(target: &Path, content: &str) -> Result<(), ChangeFailure> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| ChangeFailure::io("create parent directories", &err))?;
    }
    fs::write(target, content).map_err(|err| ChangeFailure::io("write file", &err))
}
