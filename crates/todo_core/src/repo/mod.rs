//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contract the service layer depends on.
//! - Isolate SQLite query details from use-case orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Todo::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Cancelled`) in
//!   addition to DB transport errors.

pub mod todo_repo;
