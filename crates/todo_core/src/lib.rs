//! Core domain logic for the todo list.
//! This crate is the single source of truth for business invariants.

pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use context::OpContext;
pub use tokio_util::sync::CancellationToken;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::todo::{now_epoch_ms, Priority, Todo, TodoId, TodoValidationError};
pub use repo::todo_repo::{RepoError, RepoResult, SqliteTodoRepository, TodoRepository};
pub use service::todo_service::{
    CreateTodoRequest, ErrorKind, ServiceResult, TodoService, TodoServiceError, TodoStats,
};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
