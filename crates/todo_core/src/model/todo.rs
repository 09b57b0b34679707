//! Todo domain model.
//!
//! # Responsibility
//! - Define the single managed entity and its construction gate.
//! - Own the entity-level validation rules shared by service and repository.
//!
//! # Invariants
//! - `title` is never empty for a persisted Todo.
//! - `id` is assigned by the store; `0` means "not persisted yet".
//! - `created_at` is set once by the constructor and never mutated.
//! - `due_date = None` means "no due date", never a sentinel timestamp.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Store-assigned row identifier.
pub type TodoId = i64;

/// Validation failures raised before a Todo may reach storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    /// `title` was the empty string.
    EmptyTitle,
    /// Priority text outside `low|medium|high`.
    InvalidPriority(String),
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::InvalidPriority(value) => write!(
                f,
                "invalid priority `{value}`; expected low|medium|high"
            ),
        }
    }
}

impl Error for TodoValidationError {}

/// Task urgency tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Lowercase storage/wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TodoValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(TodoValidationError::InvalidPriority(value.to_string())),
        }
    }
}

/// One task in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Store-assigned identifier; `0` before persistence.
    pub id: TodoId,
    pub title: String,
    /// Free-form details, empty when not provided.
    pub description: String,
    pub is_completed: bool,
    pub priority: Option<Priority>,
    /// Unix epoch milliseconds.
    pub due_date: Option<i64>,
    /// Unix epoch milliseconds. Immutable after construction.
    pub created_at: i64,
    /// Unix epoch milliseconds. Refreshed by the service on every mutation.
    pub updated_at: i64,
}

impl Todo {
    /// Builds a new, not yet persisted Todo.
    ///
    /// # Errors
    /// - `TodoValidationError::EmptyTitle` when `title` is empty. No partial
    ///   value is produced.
    pub fn new(title: impl Into<String>) -> Result<Self, TodoValidationError> {
        let title = title.into();
        if title.is_empty() {
            return Err(TodoValidationError::EmptyTitle);
        }

        let now = now_epoch_ms();
        Ok(Self {
            id: 0,
            title,
            description: String::new(),
            is_completed: false,
            priority: None,
            due_date: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Checks invariants that must hold before any write.
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if self.title.is_empty() {
            return Err(TodoValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Whether this Todo has been assigned a store identifier.
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}

#[cfg(test)]
mod tests {
    use super::{Priority, Todo, TodoValidationError};

    #[test]
    fn new_rejects_empty_title() {
        assert_eq!(Todo::new(""), Err(TodoValidationError::EmptyTitle));
    }

    #[test]
    fn whitespace_title_is_accepted() {
        let todo = Todo::new(" ").expect("whitespace title should be accepted");
        assert_eq!(todo.title, " ");
    }

    #[test]
    fn priority_parse_is_case_insensitive() {
        assert_eq!("HIGH".parse::<Priority>().expect("HIGH should parse"), Priority::High);
        assert_eq!(" low ".parse::<Priority>().expect("padded low should parse"), Priority::Low);
        assert!(matches!(
            "urgent".parse::<Priority>(),
            Err(TodoValidationError::InvalidPriority(value)) if value == "urgent"
        ));
    }
}
