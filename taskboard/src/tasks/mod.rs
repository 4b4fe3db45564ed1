//! Board task state for the taskboard client.
//!
//! The [`TaskStore`] owns the local task collection and mediates every
//! mutation against the remote service on a confirm-then-apply basis:
//! nothing changes locally until the service has answered. The [`board`]
//! module derives per-column views from a store snapshot.

pub mod board;
pub mod store;

pub use board::{Column, by_status, column_title, columns, render_board, task_line};
pub use store::{BoardState, Operation, TaskStore};

use taskboard_proto::task::{TaskId, TitleError};
use thiserror::Error;

use crate::client::ClientError;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The task service call failed (network or rejection).
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The title was refused before anything was sent.
    #[error(transparent)]
    InvalidTitle(#[from] TitleError),
    /// The operation needs a task that is not in the local collection.
    #[error("task not loaded: {0}")]
    NotLoaded(TaskId),
}
