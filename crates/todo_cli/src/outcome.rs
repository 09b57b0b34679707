//! Error-to-response mapping for the command line boundary.

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use todo_core::db::DbError;
use todo_core::{ErrorKind, LoggingError, RepoError, TodoServiceError, TodoValidationError};

/// Response class a failure maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    ClientError,
    NotFound,
    Timeout,
    ServerError,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::ServerError => 1,
            Self::ClientError => 2,
            Self::NotFound => 3,
            Self::Timeout => 4,
        }
    }
}

impl From<ErrorKind> for Outcome {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::EmptyTitle | ErrorKind::InvalidInput => Self::ClientError,
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::Cancelled => Self::Timeout,
            ErrorKind::Storage => Self::ServerError,
        }
    }
}

#[derive(Debug)]
pub enum CliError {
    Service(TodoServiceError),
    Db(DbError),
    Logging(LoggingError),
    Encode(serde_json::Error),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    outcome: Outcome,
    message: &'a str,
}

impl CliError {
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Service(err) => err.kind().into(),
            Self::Logging(_) => Outcome::ClientError,
            Self::Db(_) | Self::Encode(_) => Outcome::ServerError,
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.outcome().exit_code()
    }

    pub fn to_json(&self) -> String {
        let message = self.to_string();
        let body = ErrorBody {
            outcome: self.outcome(),
            message: &message,
        };
        serde_json::to_string(&body).unwrap_or(message)
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode output: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Service(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<TodoServiceError> for CliError {
    fn from(value: TodoServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Service(value.into())
    }
}

impl From<TodoValidationError> for CliError {
    fn from(value: TodoValidationError) -> Self {
        Self::Service(value.into())
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}
