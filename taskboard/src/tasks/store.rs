//! Task store: the local task collection and its sync state machine.
//!
//! Every operation moves through `idle → pending → {committed, failed}`.
//! Entering `pending` clears the last error (and, for everything but
//! [`TaskStore::move_task`], raises `loading`). The service call is awaited
//! without holding the state lock, then the outcome is applied in one step
//! by [`TaskStore::apply_result`]. Nothing is applied optimistically: a
//! failed operation leaves `items` exactly as it was.
//!
//! # Ordering
//!
//! Operations are not queued. Independent calls may be in flight at the
//! same time, and calls on the same task id are not sequenced against each
//! other: whichever response lands last wins, even if it belongs to the
//! older request. Out-of-order responses for one id can therefore
//! resurrect a stale record. Any per-id sequencing belongs in
//! `apply_result`, which sees every outcome together with its pending token.

use chrono::Utc;
use parking_lot::Mutex;
use taskboard_proto::task::{
    MAX_TASK_TITLE_LENGTH, Task, TaskDraft, TaskId, TaskPatch, TaskStatus, validate_title,
};

use super::StoreError;
use crate::client::TaskService;

/// Store operations, as recorded in pending tokens and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchAll,
    Add,
    Update,
    Delete,
    Move,
}

impl Operation {
    /// Whether the operation holds `loading` up while in flight. Moves do
    /// not, so dragging a card never blanks the rest of the board.
    #[must_use]
    pub const fn tracks_loading(self) -> bool {
        !matches!(self, Self::Move)
    }

    /// Short description used in error messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::FetchAll => "fetch tasks",
            Self::Add => "add task",
            Self::Update => "update task",
            Self::Delete => "delete task",
            Self::Move => "move task",
        }
    }
}

/// Token for an operation that has entered the pending state. Consumed by
/// [`TaskStore::apply_result`].
#[derive(Debug)]
#[must_use]
pub struct Pending {
    op: Operation,
    id: Option<TaskId>,
}

/// Effect of a confirmed response on the local collection.
#[derive(Debug, Clone, Copy)]
enum Commit<'a> {
    /// The service's list is authoritative.
    ReplaceAll(&'a [Task]),
    /// A newly created task.
    Append(&'a Task),
    /// An updated task, put back at its current position.
    Splice(&'a Task),
    /// A deleted task.
    Remove(&'a TaskId),
}

impl Commit<'_> {
    fn apply(self, items: &mut Vec<Task>) {
        match self {
            Self::ReplaceAll(tasks) => {
                items.clear();
                for task in tasks {
                    if !items.iter().any(|t| t.id == task.id) {
                        items.push(task.clone());
                    }
                }
            }
            Self::Append(task) => {
                // A fetch that landed first may already hold the record.
                if let Some(slot) = items.iter_mut().find(|t| t.id == task.id) {
                    slot.clone_from(task);
                } else {
                    items.push(task.clone());
                }
            }
            Self::Splice(task) => {
                if let Some(slot) = items.iter_mut().find(|t| t.id == task.id) {
                    slot.clone_from(task);
                } else {
                    tracing::debug!(task_id = %task.id, "update for unknown task dropped");
                }
            }
            Self::Remove(id) => items.retain(|t| &t.id != id),
        }
    }
}

/// Read-only copy of the store state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardState {
    /// Tasks in insertion order, unique by id.
    pub items: Vec<Task>,
    /// `true` while any loading-tracked operation is in flight.
    pub loading: bool,
    /// Description of the last failure, if not cleared since.
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    items: Vec<Task>,
    /// Loading-tracked operations currently in flight.
    loading_ops: usize,
    error: Option<String>,
}

/// Owns the local task collection and mediates every change through a
/// [`TaskService`].
///
/// Construct one per session and share it by reference (or `Arc`); all
/// operations take `&self` so several can be in flight at once.
pub struct TaskStore<S> {
    service: S,
    state: Mutex<State>,
    max_title_len: usize,
}

impl<S: TaskService> TaskStore<S> {
    /// Creates an empty store on top of `service`.
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: Mutex::new(State::default()),
            max_title_len: MAX_TASK_TITLE_LENGTH,
        }
    }

    /// Sets the title length limit checked before anything is sent.
    #[must_use]
    pub const fn with_max_title_len(mut self, max_title_len: usize) -> Self {
        self.max_title_len = max_title_len;
        self
    }

    /// The service this store talks to.
    pub const fn service(&self) -> &S {
        &self.service
    }

    /// Replaces the collection with the service's full list.
    ///
    /// # Errors
    ///
    /// Returns the service failure; `items` is left untouched.
    pub async fn fetch_all(&self) -> Result<Vec<Task>, StoreError> {
        let pending = self.begin(Operation::FetchAll, None);
        let result = self.service.list().await.map_err(StoreError::from);
        self.apply_result(pending, result.as_deref().map(Commit::ReplaceAll));
        result
    }

    /// Creates a task from `draft` and appends the confirmed record.
    ///
    /// The new task gets a fresh id and creation time; status defaults to
    /// `todo` and priority to `medium`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTitle`] without contacting the service
    /// if the title is empty or too long, otherwise the service failure.
    pub async fn add(&self, draft: TaskDraft) -> Result<Task, StoreError> {
        let pending = self.begin(Operation::Add, None);
        let result = self.send_create(draft).await;
        self.apply_result(pending, result.as_ref().map(Commit::Append));
        result
    }

    /// Applies `patch` to the latest full record for `id` and sends the
    /// result as a replacement.
    ///
    /// The base record is the local copy, or the service's copy when the id
    /// is not loaded. A confirmed record whose id is no longer in `items`
    /// is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTitle`] for a bad patched title, or the
    /// service failure (including not-found).
    pub async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        let pending = self.begin(Operation::Update, Some(id.clone()));
        let result = self.send_update(id, patch).await;
        self.apply_result(pending, result.as_ref().map(Commit::Splice));
        result
    }

    /// Deletes the task remotely, then locally.
    ///
    /// # Errors
    ///
    /// Returns the service failure; a second delete of the same id fails
    /// with the service's not-found rejection and changes nothing.
    pub async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        let pending = self.begin(Operation::Delete, Some(id.clone()));
        let result = self.service.remove(id).await.map_err(StoreError::from);
        self.apply_result(pending, result.as_ref().map(|&()| Commit::Remove(id)));
        result
    }

    /// Moves a loaded task to another column.
    ///
    /// Sends the full local record with only `status` changed and splices
    /// the confirmed record back in place. Does not touch `loading`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotLoaded`] without contacting the service if
    /// `id` is not in `items`, otherwise the service failure. The previous
    /// status stays in place on failure.
    pub async fn move_task(&self, id: &TaskId, status: TaskStatus) -> Result<Task, StoreError> {
        let pending = self.begin(Operation::Move, Some(id.clone()));
        let result = self.send_move(id, status).await;
        self.apply_result(pending, result.as_ref().map(Commit::Splice));
        result
    }

    /// Clears the recorded error.
    pub fn clear_error(&self) {
        self.state.lock().error = None;
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> BoardState {
        let state = self.state.lock();
        BoardState {
            items: state.items.clone(),
            loading: state.loading_ops > 0,
            error: state.error.clone(),
        }
    }

    /// Copy of the current collection.
    #[must_use]
    pub fn items(&self) -> Vec<Task> {
        self.state.lock().items.clone()
    }

    /// Whether a loading-tracked operation is in flight.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.state.lock().loading_ops > 0
    }

    /// The last recorded failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    /// Local copy of the task with `id`.
    fn local(&self, id: &TaskId) -> Option<Task> {
        self.state.lock().items.iter().find(|t| &t.id == id).cloned()
    }

    /// `idle → pending`.
    fn begin(&self, op: Operation, id: Option<TaskId>) -> Pending {
        let mut state = self.state.lock();
        state.error = None;
        if op.tracks_loading() {
            state.loading_ops += 1;
        }
        drop(state);
        tracing::debug!(op = op.describe(), task_id = ?id.as_ref().map(TaskId::as_str), "operation pending");
        Pending { op, id }
    }

    /// `pending → committed` or `pending → failed`, applied under one lock
    /// acquisition so readers never observe a half-applied outcome.
    fn apply_result(&self, pending: Pending, outcome: Result<Commit<'_>, &StoreError>) {
        let Pending { op, id } = pending;
        let task_id = id.as_ref().map(TaskId::as_str);
        let mut state = self.state.lock();
        if op.tracks_loading() {
            state.loading_ops = state.loading_ops.saturating_sub(1);
        }
        match outcome {
            Ok(commit) => {
                commit.apply(&mut state.items);
                drop(state);
                tracing::info!(op = op.describe(), task_id = ?task_id, "operation committed");
            }
            Err(e) => {
                state.error = Some(format!("failed to {}: {e}", op.describe()));
                drop(state);
                tracing::warn!(op = op.describe(), task_id = ?task_id, error = %e, "operation failed");
            }
        }
    }

    async fn send_create(&self, draft: TaskDraft) -> Result<Task, StoreError> {
        validate_title(&draft.title, self.max_title_len)?;
        let task = draft.into_task(TaskId::generate(), Utc::now());
        Ok(self.service.create(&task).await?)
    }

    async fn send_update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        if let Some(title) = &patch.title {
            validate_title(title, self.max_title_len)?;
        }
        let base = match self.local(id) {
            Some(task) => task,
            None => self.service.read(id).await?,
        };
        Ok(self.service.replace(id, &patch.apply_to(&base)).await?)
    }

    async fn send_move(&self, id: &TaskId, status: TaskStatus) -> Result<Task, StoreError> {
        let base = self
            .local(id)
            .ok_or_else(|| StoreError::NotLoaded(id.clone()))?;
        let moved = Task { status, ..base };
        Ok(self.service.replace(id, &moved).await?)
    }
}
