//! Todo use-case service.
//!
//! # Responsibility
//! - Provide the create/list/get/update/delete entry points transport code
//!   calls.
//! - Apply entity validation on write paths before delegating to storage.
//! - Translate repository outcomes into domain-level error kinds.
//!
//! # Invariants
//! - The service holds no mutable state; concurrency is the store's concern.
//! - Invalid input never reaches the repository.
//! - `updated_at` is stamped here on every mutation, not by the store.
//! - Repository failures are surfaced immediately; nothing is retried or
//!   logged here.

use crate::context::OpContext;
use crate::model::todo::{now_epoch_ms, Priority, Todo, TodoId, TodoValidationError};
use crate::repo::todo_repo::{RepoError, TodoRepository};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for todo use-cases.
#[derive(Debug)]
pub enum TodoServiceError {
    /// Input rejected by entity validation.
    Validation(TodoValidationError),
    /// Target todo does not exist.
    NotFound(TodoId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

/// Coarse outcome class used by transport code to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EmptyTitle,
    InvalidInput,
    NotFound,
    Cancelled,
    Storage,
}

impl TodoServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(TodoValidationError::EmptyTitle) => ErrorKind::EmptyTitle,
            Self::Validation(TodoValidationError::InvalidPriority(_)) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Repo(RepoError::Cancelled) => ErrorKind::Cancelled,
            Self::Repo(_) => ErrorKind::Storage,
        }
    }
}

impl Display for TodoServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TodoServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<TodoValidationError> for TodoServiceError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for TodoServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, TodoServiceError>;

/// Creation input carrying the optional detail fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: Option<String>,
    /// Free text; must be one of `low|medium|high` when present.
    pub priority: Option<String>,
    /// Unix epoch milliseconds.
    pub due_date: Option<i64>,
}

/// Completion summary over the whole list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    /// `completed * 100 / total`, rounded down; `0` for an empty list.
    pub completion_rate_percent: u8,
}

impl TodoStats {
    pub fn from_todos(todos: &[Todo]) -> Self {
        let total = todos.len();
        let completed = todos.iter().filter(|todo| todo.is_completed).count();
        let completion_rate_percent = if total == 0 {
            0
        } else {
            (completed * 100 / total) as u8
        };
        Self {
            total,
            completed,
            active: total - completed,
            completion_rate_percent,
        }
    }
}

/// Todo service facade over a repository implementation.
pub struct TodoService<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a todo from a title alone.
    ///
    /// Fails with `Validation(EmptyTitle)` without touching storage when
    /// `title` is empty.
    pub fn create_todo(&self, ctx: &OpContext, title: impl Into<String>) -> ServiceResult<Todo> {
        let mut todo = Todo::new(title)?;
        self.repo.create(ctx, &mut todo)?;
        Ok(todo)
    }

    /// Creates a todo with description, priority and due date.
    pub fn create_todo_with(
        &self,
        ctx: &OpContext,
        request: CreateTodoRequest,
    ) -> ServiceResult<Todo> {
        let mut todo = Todo::new(request.title)?;
        todo.priority = request
            .priority
            .as_deref()
            .map(str::parse::<Priority>)
            .transpose()?;
        todo.description = request.description.unwrap_or_default();
        todo.due_date = request.due_date;

        self.repo.create(ctx, &mut todo)?;
        Ok(todo)
    }

    /// Lists all todos, newest first.
    pub fn get_all_todos(&self, ctx: &OpContext) -> ServiceResult<Vec<Todo>> {
        Ok(self.repo.fetch_all(ctx)?)
    }

    pub fn get_todo_by_id(&self, ctx: &OpContext, id: TodoId) -> ServiceResult<Todo> {
        Ok(self.repo.get_by_id(ctx, id)?)
    }

    /// Sets the completion flag. Idempotent for repeated values.
    pub fn update_todo_status(
        &self,
        ctx: &OpContext,
        id: TodoId,
        is_completed: bool,
    ) -> ServiceResult<()> {
        self.repo
            .update_status(ctx, id, is_completed, now_epoch_ms())?;
        Ok(())
    }

    /// Replaces all mutable fields of an existing todo.
    ///
    /// The title is re-validated and `updated_at` stamped from the clock
    /// before the write. `created_at` is never written back; the stored row
    /// is returned, so caller edits to it do not leak into the result.
    pub fn update_todo(&self, ctx: &OpContext, mut todo: Todo) -> ServiceResult<Todo> {
        todo.validate()?;
        todo.updated_at = now_epoch_ms();
        self.repo.update(ctx, &todo)?;
        Ok(self.repo.get_by_id(ctx, todo.id)?)
    }

    /// Deletes a todo by id.
    ///
    /// Deleting an unknown id is not an error; the returned flag tells
    /// whether a row was actually removed.
    pub fn delete_todo(&self, ctx: &OpContext, id: TodoId) -> ServiceResult<bool> {
        Ok(self.repo.delete(ctx, id)?)
    }

    /// Computes completion statistics over the full list.
    pub fn todo_stats(&self, ctx: &OpContext) -> ServiceResult<TodoStats> {
        let todos = self.repo.fetch_all(ctx)?;
        Ok(TodoStats::from_todos(&todos))
    }
}
