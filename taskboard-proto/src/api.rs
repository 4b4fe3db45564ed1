//! HTTP resource conventions shared by the task client and the task service.

use serde::{Deserialize, Serialize};

/// Path segment of the task collection resource (`/tasks`).
pub const TASKS_RESOURCE: &str = "tasks";

/// JSON body the service returns alongside a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable failure reason.
    pub error: String,
}

impl ErrorBody {
    /// Creates an error body with the given message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
