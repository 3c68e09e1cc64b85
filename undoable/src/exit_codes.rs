//! Stable exit codes for `undoable` commands.
//!
//! A batch with per-file failures still exits `OK`: the itemized results are
//! the outcome, there is no batch-level pass/fail code.

/// Command completed.
pub const OK: i32 = 0;
/// Invalid change set, config, root, or other I/O error before the batch ran.
pub const INVALID: i32 = 1;
/// `undoable revert` found no recorded session.
pub const NOTHING_TO_REVERT: i32 = 2;
