//! I/O side of the engine: filesystem mutation, ledger persistence, loading.

pub mod applier;
mod atomic;
pub mod change_set_store;
pub mod config;
pub mod containment;
pub mod init;
pub mod ledger;
