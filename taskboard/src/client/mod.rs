//! Request layer between the task store and the remote task service.
//!
//! Defines the [`TaskService`] trait, one async operation per CRUD verb.
//! Implementations:
//! - [`http::TaskClient`]: HTTP binding against a `/tasks` resource
//! - [`memory::MemoryService`]: in-process collection for offline runs and tests

pub mod http;
pub mod memory;

use std::future::Future;

use taskboard_proto::task::{Task, TaskId};

pub use http::TaskClient;
pub use memory::{MemoryService, SeedError};

/// Errors that can occur while talking to the task service.
///
/// The store treats every variant the same way ("operation failed"), but
/// callers can tell a network failure from a refusal by the service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a usable response (unreachable host,
    /// timeout, or a body that could not be decoded).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("remote rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code returned by the service.
        status: u16,
        /// Failure reason reported by the service.
        message: String,
    },

    /// The configured base URL cannot address the task resource.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ClientError {
    /// Creates a rejection with the given status and message.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Returns `true` for network-level failures.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if the service refused the request.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Returns `true` if the service reported the task as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Rejected { status: 404, .. })
    }
}

/// Remote CRUD operations over the task resource.
///
/// Calls are independent and stateless; each returns the record(s) as
/// confirmed by the service.
pub trait TaskService: Send + Sync {
    /// Fetch every task, in service order.
    fn list(&self) -> impl Future<Output = Result<Vec<Task>, ClientError>> + Send;

    /// Create a task. The service may assign or normalize fields.
    fn create(&self, task: &Task) -> impl Future<Output = Result<Task, ClientError>> + Send;

    /// Fetch a single task.
    fn read(&self, id: &TaskId) -> impl Future<Output = Result<Task, ClientError>> + Send;

    /// Replace the task stored under `id` with `task`.
    fn replace(
        &self,
        id: &TaskId,
        task: &Task,
    ) -> impl Future<Output = Result<Task, ClientError>> + Send;

    /// Delete the task stored under `id`.
    fn remove(&self, id: &TaskId) -> impl Future<Output = Result<(), ClientError>> + Send;
}
