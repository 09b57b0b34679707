//! Command dispatch: argument decoding in, JSON out.

use crate::outcome::CliError;
use crate::Command;
use log::{info, warn};
use serde::Serialize;
use std::time::Instant;
use todo_core::{CreateTodoRequest, OpContext, Priority, TodoId, TodoRepository, TodoService};

#[derive(Serialize)]
struct StatusChanged {
    id: TodoId,
    is_completed: bool,
}

#[derive(Serialize)]
struct Deleted {
    id: TodoId,
    removed: bool,
}

/// Runs one command against `service` and returns its JSON rendering.
pub fn dispatch<R: TodoRepository>(
    service: &TodoService<R>,
    ctx: &OpContext,
    command: Command,
) -> Result<String, CliError> {
    let name = command_name(&command);
    let started_at = Instant::now();

    let result = execute(service, ctx, command);
    match &result {
        Ok(_) => info!(
            "event=command module=cli status=ok command={name} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=command module=cli status=error command={name} duration_ms={} outcome={:?}",
            started_at.elapsed().as_millis(),
            err.outcome()
        ),
    }
    result
}

fn execute<R: TodoRepository>(
    service: &TodoService<R>,
    ctx: &OpContext,
    command: Command,
) -> Result<String, CliError> {
    let output = match command {
        Command::Add {
            title,
            description,
            priority,
            due,
        } => {
            let request = CreateTodoRequest {
                title,
                description,
                priority,
                due_date: due,
            };
            to_json(&service.create_todo_with(ctx, request)?)?
        }
        Command::List => to_json(&service.get_all_todos(ctx)?)?,
        Command::Get { id } => to_json(&service.get_todo_by_id(ctx, id)?)?,
        Command::Status { id, completed } => {
            service.update_todo_status(ctx, id, completed)?;
            to_json(&StatusChanged {
                id,
                is_completed: completed,
            })?
        }
        Command::Update {
            id,
            title,
            description,
            priority,
            due,
            clear_due,
        } => {
            let mut todo = service.get_todo_by_id(ctx, id)?;
            if let Some(title) = title {
                todo.title = title;
            }
            if let Some(description) = description {
                todo.description = description;
            }
            if let Some(priority) = priority {
                todo.priority = Some(priority.parse::<Priority>()?);
            }
            if clear_due {
                todo.due_date = None;
            } else if due.is_some() {
                todo.due_date = due;
            }
            to_json(&service.update_todo(ctx, todo)?)?
        }
        Command::Delete { id } => {
            let removed = service.delete_todo(ctx, id)?;
            to_json(&Deleted { id, removed })?
        }
        Command::Stats => to_json(&service.todo_stats(ctx)?)?,
        Command::Ping => to_json(&serde_json::json!({
            "ping": todo_core::ping(),
            "version": todo_core::core_version(),
        }))?,
    };
    Ok(output)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Add { .. } => "add",
        Command::List => "list",
        Command::Get { .. } => "get",
        Command::Status { .. } => "status",
        Command::Update { .. } => "update",
        Command::Delete { .. } => "delete",
        Command::Stats => "stats",
        Command::Ping => "ping",
    }
}
