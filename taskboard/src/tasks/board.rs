//! Column projection of a store snapshot.
//!
//! Pure functions over [`BoardState`]; nothing here touches the store or
//! the network. Each column keeps the relative order of `items`.

use std::fmt::Write as _;

use taskboard_proto::task::{Task, TaskStatus};

use super::BoardState;

/// One board column and the tasks currently in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column<'a> {
    pub status: TaskStatus,
    pub title: &'static str,
    pub tasks: Vec<&'a Task>,
}

/// Heading shown above the column for `status`.
#[must_use]
pub const fn column_title(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "To Do",
        TaskStatus::InProgress => "In Progress",
        TaskStatus::Done => "Done",
    }
}

/// Tasks whose status equals `status`, in collection order.
#[must_use]
pub fn by_status(state: &BoardState, status: TaskStatus) -> Vec<&Task> {
    state.items.iter().filter(|t| t.status == status).collect()
}

/// The three columns in board order: todo, in progress, done.
#[must_use]
pub fn columns(state: &BoardState) -> [Column<'_>; 3] {
    TaskStatus::ALL.map(|status| Column {
        status,
        title: column_title(status),
        tasks: by_status(state, status),
    })
}

/// Plain-text rendering of the board for terminal output.
///
/// One section per column with its task count, then one line per task:
/// `  [id] title (priority)`. A pending load or a recorded error is shown
/// above the columns.
#[must_use]
pub fn render_board(state: &BoardState) -> String {
    let mut out = String::new();
    if state.loading {
        out.push_str("Loading...\n");
    }
    if let Some(error) = &state.error {
        let _ = writeln!(out, "Error: {error}");
    }
    for (i, column) in columns(state).iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{} ({})", column.title, column.tasks.len());
        if column.tasks.is_empty() {
            out.push_str("  (empty)\n");
        }
        for task in &column.tasks {
            let _ = writeln!(out, "  {}", task_line(task));
        }
    }
    out
}

/// Single-line summary of a task.
#[must_use]
pub fn task_line(task: &Task) -> String {
    format!("[{}] {} ({})", task.id, task.title, task.priority)
}
