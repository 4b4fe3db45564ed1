//! In-process task service for offline runs and tests.
//!
//! [`MemoryService`] keeps an ordered task collection behind a shared
//! mutex and answers with the same outcomes as the HTTP service: missing ids
//! are 404 rejections, duplicate ids on create are 409, empty titles are 400.
//! Clones share the same collection.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use taskboard_proto::task::{MAX_TASK_TITLE_LENGTH, Task, TaskId, validate_title};

use super::{ClientError, TaskService};

/// Errors from loading a seed file for [`MemoryService::from_seed_file`].
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not a JSON array of tasks.
    #[error("invalid seed file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Default)]
struct Inner {
    tasks: Vec<Task>,
    /// Rejections handed out to the next calls, oldest first.
    scripted_failures: VecDeque<(u16, String)>,
    calls: usize,
}

/// Shared in-memory task collection implementing [`TaskService`].
#[derive(Debug, Clone, Default)]
pub struct MemoryService {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryService {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service holding `tasks` in the given order.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let service = Self::new();
        service.inner.lock().tasks = tasks;
        service
    }

    /// Creates a service holding the tasks in a JSON file, in the same
    /// array format `GET /tasks` returns. Changes are never written back.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError`] if the file cannot be read or decoded.
    pub fn from_seed_file(path: &Path) -> Result<Self, SeedError> {
        let text = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let tasks: Vec<Task> = serde_json::from_str(&text).map_err(|source| SeedError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), tasks = tasks.len(), "seeded in-memory service");
        Ok(Self::with_tasks(tasks))
    }

    /// Makes the next call fail with the given status and message,
    /// whatever the operation. Queued failures are consumed in order.
    pub fn reject_next(&self, status: u16, message: impl Into<String>) {
        self.inner
            .lock()
            .scripted_failures
            .push_back((status, message.into()));
    }

    /// Current collection as stored by the service.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.inner.lock().tasks.clone()
    }

    /// Number of operations the service has answered.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.inner.lock().calls
    }

    /// Runs `op` against the collection unless a scripted failure is queued.
    fn answer<T>(
        &self,
        op: impl FnOnce(&mut Vec<Task>) -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        if let Some((status, message)) = inner.scripted_failures.pop_front() {
            return Err(ClientError::rejected(status, message));
        }
        op(&mut inner.tasks)
    }
}

fn not_found(id: &TaskId) -> ClientError {
    ClientError::rejected(404, format!("task not found: {id}"))
}

impl TaskService for MemoryService {
    async fn list(&self) -> Result<Vec<Task>, ClientError> {
        self.answer(|tasks| Ok(tasks.clone()))
    }

    async fn create(&self, task: &Task) -> Result<Task, ClientError> {
        self.answer(|tasks| {
            validate_title(&task.title, MAX_TASK_TITLE_LENGTH)
                .map_err(|e| ClientError::rejected(400, e.to_string()))?;
            if tasks.iter().any(|t| t.id == task.id) {
                return Err(ClientError::rejected(
                    409,
                    format!("task already exists: {}", task.id),
                ));
            }
            tasks.push(task.clone());
            Ok(task.clone())
        })
    }

    async fn read(&self, id: &TaskId) -> Result<Task, ClientError> {
        self.answer(|tasks| {
            tasks
                .iter()
                .find(|t| &t.id == id)
                .cloned()
                .ok_or_else(|| not_found(id))
        })
    }

    async fn replace(&self, id: &TaskId, task: &Task) -> Result<Task, ClientError> {
        self.answer(|tasks| {
            validate_title(&task.title, MAX_TASK_TITLE_LENGTH)
                .map_err(|e| ClientError::rejected(400, e.to_string()))?;
            let slot = tasks
                .iter_mut()
                .find(|t| &t.id == id)
                .ok_or_else(|| not_found(id))?;
            let created_at = slot.created_at;
            slot.clone_from(task);
            slot.id = id.clone();
            slot.created_at = created_at;
            Ok(slot.clone())
        })
    }

    async fn remove(&self, id: &TaskId) -> Result<(), ClientError> {
        self.answer(|tasks| {
            let index = tasks
                .iter()
                .position(|t| &t.id == id)
                .ok_or_else(|| not_found(id))?;
            tasks.remove(index);
            Ok(())
        })
    }
}
