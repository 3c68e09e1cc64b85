//! Reversible application of LLM-authored change sets.
//!
//! A change set is an ordered list of CREATE/REPLACE/DELETE operations on
//! paths relative to a project root. Applying it records the exact inverse in
//! a single-slot ledger (`.undoable/revert.json`) so it can be reverted later.
//!
//! - **[`core`]**: Pure, deterministic logic (change model, selection, inverse
//!   derivation, lexical path checks). No I/O.
//! - **[`io`]**: Side-effecting operations (containment guard, applier,
//!   ledger, change set loading, config).
//!
//! Orchestration modules ([`apply`], [`revert`]) coordinate core logic with
//! I/O to implement CLI commands.

pub mod apply;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod revert;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
