//! In-memory task collection backing the service.
//!
//! [`TaskRepository`] keeps tasks in insertion order behind a [`RwLock`].
//! Nothing is written to disk; the collection lives as long as the process.

use taskboard_proto::task::{Task, TaskId, TaskPatch};
use tokio::sync::RwLock;

/// Errors returned by repository lookups and inserts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// No task with the given id.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// A task with the given id already exists.
    #[error("task already exists: {0}")]
    Duplicate(TaskId),
}

/// Ordered in-memory task collection, unique by id.
#[derive(Default)]
pub struct TaskRepository {
    tasks: RwLock<Vec<Task>>,
}

impl TaskRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-filled with `tasks`. Later duplicates of an
    /// id are dropped.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let mut unique: Vec<Task> = Vec::with_capacity(tasks.len());
        for task in tasks {
            if !unique.iter().any(|t| t.id == task.id) {
                unique.push(task);
            }
        }
        Self {
            tasks: RwLock::new(unique),
        }
    }

    /// Returns every task in insertion order.
    pub async fn list(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    /// Returns the task with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no such task exists.
    pub async fn get(&self, id: &TaskId) -> Result<Task, RepositoryError> {
        let tasks = self.tasks.read().await;
        tasks
            .iter()
            .find(|t| &t.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))
    }

    /// Appends a new task.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Duplicate`] if the id is already taken.
    pub async fn insert(&self, task: Task) -> Result<Task, RepositoryError> {
        let mut tasks = self.tasks.write().await;
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(RepositoryError::Duplicate(task.id));
        }
        tasks.push(task.clone());
        drop(tasks);
        Ok(task)
    }

    /// Replaces the stored task in place. The stored `createdAt` is kept.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no such task exists.
    pub async fn replace(&self, id: &TaskId, mut task: Task) -> Result<Task, RepositoryError> {
        let mut tasks = self.tasks.write().await;
        let slot = tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        task.id = id.clone();
        task.created_at = slot.created_at;
        slot.clone_from(&task);
        drop(tasks);
        Ok(task)
    }

    /// Merges the present patch fields into the stored task.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no such task exists.
    pub async fn patch(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RepositoryError> {
        let mut tasks = self.tasks.write().await;
        let slot = tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        *slot = patch.apply_to(slot);
        Ok(slot.clone())
    }

    /// Removes the task with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no such task exists.
    pub async fn remove(&self, id: &TaskId) -> Result<Task, RepositoryError> {
        let mut tasks = self.tasks.write().await;
        let index = tasks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        Ok(tasks.remove(index))
    }

    /// Returns the number of stored tasks.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Returns `true` if no tasks are stored.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}
