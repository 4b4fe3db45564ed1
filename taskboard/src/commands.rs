//! Runs one CLI [`Command`] against a [`TaskStore`] and formats the result.
//!
//! Commands that address an existing task load the board first, so the
//! store has the full record to build its replacement payload from.

use std::fmt::Write as _;

use taskboard_proto::task::{Task, TaskDraft, TaskPatch};

use crate::client::TaskService;
use crate::config::Command;
use crate::tasks::{StoreError, TaskStore, render_board, task_line};

/// Executes `command` and returns the text to print on success.
///
/// # Errors
///
/// Returns the store error of the first failing operation. The store has
/// already recorded it in its `error` field.
pub async fn execute<S: TaskService>(
    store: &TaskStore<S>,
    command: &Command,
) -> Result<String, StoreError> {
    match command {
        Command::Board => {
            store.fetch_all().await?;
            Ok(render_board(&store.snapshot()))
        }
        Command::List => {
            let tasks = store.fetch_all().await?;
            let mut out = String::new();
            for task in &tasks {
                let _ = writeln!(out, "{:<10} {}", task.status.as_str(), task_line(task));
            }
            Ok(out)
        }
        Command::Show { id } => {
            store.fetch_all().await?;
            let task = store
                .items()
                .into_iter()
                .find(|t| &t.id == id)
                .ok_or_else(|| StoreError::NotLoaded(id.clone()))?;
            Ok(describe(&task))
        }
        Command::Add {
            title,
            description,
            priority,
            status,
        } => {
            let draft = TaskDraft {
                title: title.clone(),
                description: description.clone(),
                priority: *priority,
                status: *status,
            };
            let task = store.add(draft).await?;
            Ok(format!("created {}\n", task_line(&task)))
        }
        Command::Update {
            id,
            title,
            description,
            priority,
            status,
        } => {
            let patch = TaskPatch {
                title: title.clone(),
                description: description.clone(),
                priority: *priority,
                status: *status,
            };
            store.fetch_all().await?;
            let task = store.update(id, &patch).await?;
            Ok(format!("updated {}\n", task_line(&task)))
        }
        Command::Delete { id } => {
            store.fetch_all().await?;
            store.delete(id).await?;
            Ok(format!("deleted {id}\n"))
        }
        Command::Move { id, status } => {
            store.fetch_all().await?;
            let task = store.move_task(id, *status).await?;
            Ok(format!("moved {} to {}\n", task_line(&task), task.status))
        }
    }
}

/// Multi-line detail view of one task.
fn describe(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id:          {}", task.id);
    let _ = writeln!(out, "title:       {}", task.title);
    let _ = writeln!(out, "status:      {}", task.status);
    let _ = writeln!(out, "priority:    {}", task.priority);
    let _ = writeln!(out, "created:     {}", task.created_at.to_rfc3339());
    if let Some(description) = &task.description {
        let _ = writeln!(out, "description: {description}");
    }
    out
}
