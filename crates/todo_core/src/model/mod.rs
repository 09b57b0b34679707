//! Domain model for the task list.
//!
//! # Responsibility
//! - Define the Todo entity and the validation gate every write passes.
//!
//! # Invariants
//! - Deletion is a hard delete; there is no tombstone state.

pub mod todo;
