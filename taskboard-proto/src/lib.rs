//! Shared wire definitions for the taskboard client and task service.

pub mod api;
pub mod task;

pub use task::{Priority, Task, TaskDraft, TaskId, TaskPatch, TaskStatus};
