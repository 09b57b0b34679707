//! Todo repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the storage capabilities the service layer depends on.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Todo::validate()` before SQL mutations.
//! - Missing rows surface as `RepoError::NotFound`, never as a driver error.
//! - Read paths reject malformed persisted rows instead of masking them.
//! - Every call observes its `OpContext`; a cancelled context yields
//!   `RepoError::Cancelled`.

use crate::context::OpContext;
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::todo::{Priority, Todo, TodoId, TodoValidationError};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TODO_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    is_completed,
    priority,
    due_date,
    created_at,
    updated_at
FROM todos";

const REQUIRED_COLUMNS: [&str; 8] = [
    "id",
    "title",
    "description",
    "is_completed",
    "priority",
    "due_date",
    "created_at",
    "updated_at",
];

// Virtual machine instructions between cancellation checks.
const PROGRESS_CHECK_OPS: i32 = 1_000;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for todo persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TodoValidationError),
    Db(DbError),
    NotFound(TodoId),
    InvalidData(String),
    /// The caller's context was cancelled or its deadline passed.
    Cancelled,
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted todo data: {message}"),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is behind required {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TodoValidationError> for RepoError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(inner, _)
                if inner.code == ErrorCode::OperationInterrupted =>
            {
                Self::Cancelled
            }
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}

/// Storage capabilities required by the todo service.
///
/// Exactly one implementation is active per process; it is chosen at startup
/// and handed to `TodoService::new`.
pub trait TodoRepository {
    /// Persists a new row and writes the store-assigned id into `todo.id`.
    fn create(&self, ctx: &OpContext, todo: &mut Todo) -> RepoResult<TodoId>;
    /// Returns all rows, newest `created_at` first. Empty store yields `[]`.
    fn fetch_all(&self, ctx: &OpContext) -> RepoResult<Vec<Todo>>;
    /// Returns one row or `RepoError::NotFound`.
    fn get_by_id(&self, ctx: &OpContext, id: TodoId) -> RepoResult<Todo>;
    /// Replaces all mutable fields of the row identified by `todo.id`.
    fn update(&self, ctx: &OpContext, todo: &Todo) -> RepoResult<()>;
    /// Sets only the completion flag (and the supplied `updated_at`).
    fn update_status(
        &self,
        ctx: &OpContext,
        id: TodoId,
        is_completed: bool,
        updated_at: i64,
    ) -> RepoResult<()>;
    /// Removes the row. Returns whether a row was actually removed.
    fn delete(&self, ctx: &OpContext, id: TodoId) -> RepoResult<bool>;
}

impl<R: TodoRepository + ?Sized> TodoRepository for &R {
    fn create(&self, ctx: &OpContext, todo: &mut Todo) -> RepoResult<TodoId> {
        (**self).create(ctx, todo)
    }

    fn fetch_all(&self, ctx: &OpContext) -> RepoResult<Vec<Todo>> {
        (**self).fetch_all(ctx)
    }

    fn get_by_id(&self, ctx: &OpContext, id: TodoId) -> RepoResult<Todo> {
        (**self).get_by_id(ctx, id)
    }

    fn update(&self, ctx: &OpContext, todo: &Todo) -> RepoResult<()> {
        (**self).update(ctx, todo)
    }

    fn update_status(
        &self,
        ctx: &OpContext,
        id: TodoId,
        is_completed: bool,
        updated_at: i64,
    ) -> RepoResult<()> {
        (**self).update_status(ctx, id, is_completed, updated_at)
    }

    fn delete(&self, ctx: &OpContext, id: TodoId) -> RepoResult<bool> {
        (**self).delete(ctx, id)
    }
}

/// SQLite-backed todo repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema
    ///   does not match the expected `todos` shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Runs `op` with a progress handler that interrupts SQLite once `ctx`
    /// is done.
    fn with_context<T>(
        &self,
        ctx: &OpContext,
        op: impl FnOnce(&Connection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        if ctx.is_done() {
            return Err(RepoError::Cancelled);
        }

        let watched = ctx.clone();
        self.conn
            .progress_handler(PROGRESS_CHECK_OPS, Some(move || watched.is_done()));
        let result = op(self.conn);
        self.conn
            .progress_handler(PROGRESS_CHECK_OPS, None::<fn() -> bool>);
        result
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn create(&self, ctx: &OpContext, todo: &mut Todo) -> RepoResult<TodoId> {
        todo.validate()?;

        let id = self.with_context(ctx, |conn| {
            conn.execute(
                "INSERT INTO todos (
                    title,
                    description,
                    is_completed,
                    priority,
                    due_date,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    todo.title.as_str(),
                    todo.description.as_str(),
                    todo.is_completed,
                    todo.priority.map(Priority::as_str),
                    todo.due_date,
                    todo.created_at,
                    todo.updated_at,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        todo.id = id;
        Ok(id)
    }

    fn fetch_all(&self, ctx: &OpContext) -> RepoResult<Vec<Todo>> {
        self.with_context(ctx, |conn| {
            let mut stmt =
                conn.prepare(&format!("{TODO_SELECT_SQL} ORDER BY created_at DESC, id DESC;"))?;
            let mut rows = stmt.query([])?;
            let mut todos = Vec::new();
            while let Some(row) = rows.next()? {
                todos.push(parse_todo_row(row)?);
            }
            Ok(todos)
        })
    }

    fn get_by_id(&self, ctx: &OpContext, id: TodoId) -> RepoResult<Todo> {
        self.with_context(ctx, |conn| {
            let mut stmt = conn.prepare(&format!("{TODO_SELECT_SQL} WHERE id = ?1;"))?;
            let mut rows = stmt.query([id])?;
            let todo = match rows.next()? {
                Some(row) => parse_todo_row(row)?,
                None => return Err(RepoError::NotFound(id)),
            };
            Ok(todo)
        })
    }

    fn update(&self, ctx: &OpContext, todo: &Todo) -> RepoResult<()> {
        todo.validate()?;

        let changed = self.with_context(ctx, |conn| {
            Ok(conn.execute(
                "UPDATE todos
                 SET
                    title = ?1,
                    description = ?2,
                    is_completed = ?3,
                    priority = ?4,
                    due_date = ?5,
                    updated_at = ?6
                 WHERE id = ?7;",
                params![
                    todo.title.as_str(),
                    todo.description.as_str(),
                    todo.is_completed,
                    todo.priority.map(Priority::as_str),
                    todo.due_date,
                    todo.updated_at,
                    todo.id,
                ],
            )?)
        })?;

        if changed == 0 {
            return Err(RepoError::NotFound(todo.id));
        }

        Ok(())
    }

    fn update_status(
        &self,
        ctx: &OpContext,
        id: TodoId,
        is_completed: bool,
        updated_at: i64,
    ) -> RepoResult<()> {
        let changed = self.with_context(ctx, |conn| {
            Ok(conn.execute(
                "UPDATE todos SET is_completed = ?1, updated_at = ?2 WHERE id = ?3;",
                params![is_completed, updated_at, id],
            )?)
        })?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete(&self, ctx: &OpContext, id: TodoId) -> RepoResult<bool> {
        let removed = self.with_context(ctx, |conn| {
            Ok(conn.execute("DELETE FROM todos WHERE id = ?1;", [id])?)
        })?;
        Ok(removed > 0)
    }
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<Todo> {
    let id: TodoId = row.get("id")?;

    let title: String = row.get("title")?;
    if title.is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty title in todos.title for id {id}"
        )));
    }

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_completed value `{other}` in todos.is_completed"
            )));
        }
    };

    // Rows written by older clients may carry '' for "no priority".
    let priority = match row.get::<_, Option<String>>("priority")? {
        Some(value) if value.is_empty() => None,
        Some(value) => Some(value.parse::<Priority>().map_err(|_| {
            RepoError::InvalidData(format!("invalid priority `{value}` in todos.priority"))
        })?),
        None => None,
    };

    Ok(Todo {
        id,
        title,
        description: row
            .get::<_, Option<String>>("description")?
            .unwrap_or_default(),
        is_completed,
        priority,
        due_date: row.get("due_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "todos")? {
        return Err(RepoError::MissingRequiredTable("todos"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "todos", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "todos",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
