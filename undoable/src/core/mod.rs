//! Deterministic, pure logic shared by the apply/revert engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod inverse;
pub mod path;
pub mod selection;
pub mod summary;
pub mod types;
