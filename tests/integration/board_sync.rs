//! End-to-end board sync against an in-process `taskboard-server`.
//!
//! Each test binds the service on an OS-assigned port and drives a
//! `TaskStore<TaskClient>` over real HTTP, checking both the local board
//! state and what the service ended up storing.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use taskboard::client::{ClientError, TaskClient, TaskService};
use taskboard::config::ServiceConfig;
use taskboard::tasks::{StoreError, TaskStore, by_status, columns};
use taskboard_proto::task::{Priority, Task, TaskDraft, TaskId, TaskPatch, TaskStatus};
use taskboard_server::service::{ServiceState, start_server_with_state};
use taskboard_server::store::TaskRepository;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn seed_task(id: &str, title: &str, status: TaskStatus) -> Task {
    Task {
        id: TaskId::new(id),
        title: title.to_string(),
        description: None,
        priority: Priority::Medium,
        status,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
    }
}

/// Starts a service holding `tasks` and returns a store talking to it,
/// plus the shared service state for inspecting what was stored.
async fn board_with(tasks: Vec<Task>) -> (TaskStore<TaskClient>, Arc<ServiceState>) {
    let state = Arc::new(ServiceState::with_config(
        64 * 1024,
        TaskRepository::with_tasks(tasks),
    ));
    let (addr, _handle) = start_server_with_state("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("failed to start task service");

    let client = TaskClient::new(&ServiceConfig {
        base_url: format!("http://{addr}"),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
    })
    .unwrap();
    (TaskStore::new(client), state)
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_populates_columns() {
    let (store, _) = board_with(vec![
        seed_task("1", "Design", TaskStatus::Done),
        seed_task("2", "Build", TaskStatus::InProgress),
        seed_task("3", "Test", TaskStatus::Todo),
        seed_task("4", "Ship", TaskStatus::Todo),
    ])
    .await;

    store.fetch_all().await.unwrap();
    let state = store.snapshot();
    assert!(!state.loading);
    assert_eq!(state.error, None);

    let todo: Vec<&str> = by_status(&state, TaskStatus::Todo)
        .iter()
        .map(|t| t.title.as_str())
        .collect();
    assert_eq!(todo, vec!["Test", "Ship"]);

    let [todo_col, doing_col, done_col] = columns(&state);
    assert_eq!(todo_col.tasks.len(), 2);
    assert_eq!(doing_col.tasks.len(), 1);
    assert_eq!(done_col.tasks.len(), 1);
}

#[tokio::test]
async fn unreachable_service_sets_error() {
    let client = TaskClient::new(&ServiceConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(1),
    })
    .unwrap();
    let store = TaskStore::new(client);

    let err = store.fetch_all().await.unwrap_err();
    assert!(matches!(err, StoreError::Client(ref e) if e.is_transport()));
    let state = store.snapshot();
    assert!(state.items.is_empty());
    assert!(!state.loading);
    assert!(
        state
            .error
            .is_some_and(|e| e.starts_with("failed to fetch tasks: transport error"))
    );
}

// ---------------------------------------------------------------------------
// Add / update / delete / move
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_is_stored_remotely() {
    let (store, state) = board_with(Vec::new()).await;

    let task = store.add(TaskDraft::new("X")).await.unwrap();
    assert_eq!(task.status, TaskStatus::Todo);
    assert_eq!(store.items(), vec![task.clone()]);

    let stored = state.repo.get(&task.id).await.unwrap();
    assert_eq!(stored, task);
}

#[tokio::test]
async fn add_with_explicit_fields() {
    let (store, _) = board_with(Vec::new()).await;
    let draft = TaskDraft {
        title: "Review".to_string(),
        description: Some("PR #12".to_string()),
        priority: Some(Priority::High),
        status: Some(TaskStatus::InProgress),
    };

    let task = store.add(draft).await.unwrap();
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.description.as_deref(), Some("PR #12"));
}

#[tokio::test]
async fn move_round_trips_through_service() {
    let (store, state) = board_with(vec![seed_task("1", "Card", TaskStatus::Todo)]).await;
    store.fetch_all().await.unwrap();

    let moved = store
        .move_task(&TaskId::new("1"), TaskStatus::Done)
        .await
        .unwrap();
    assert_eq!(moved.status, TaskStatus::Done);
    assert_eq!(moved.title, "Card");
    assert_eq!(store.items(), vec![moved.clone()]);

    let stored = state.repo.get(&TaskId::new("1")).await.unwrap();
    assert_eq!(stored, moved);
}

#[tokio::test]
async fn update_missing_id_reports_not_found() {
    let (store, _) = board_with(vec![seed_task("1", "Card", TaskStatus::Todo)]).await;
    store.fetch_all().await.unwrap();
    let before = store.items();

    let err = store
        .update(&TaskId::new("missing-id"), &TaskPatch::status(TaskStatus::Done))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Client(ref e) if e.is_not_found()));

    let state = store.snapshot();
    assert_eq!(state.items, before);
    assert!(!state.loading);
    assert!(state.error.is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn update_keeps_untouched_fields() {
    let mut seeded = seed_task("1", "Card", TaskStatus::Todo);
    seeded.description = Some("details".to_string());
    let (store, state) = board_with(vec![seeded]).await;
    store.fetch_all().await.unwrap();

    let patch = TaskPatch {
        title: Some("Card v2".to_string()),
        ..TaskPatch::default()
    };
    let updated = store.update(&TaskId::new("1"), &patch).await.unwrap();
    assert_eq!(updated.title, "Card v2");
    assert_eq!(updated.description.as_deref(), Some("details"));

    let stored = state.repo.get(&TaskId::new("1")).await.unwrap();
    assert_eq!(stored.description.as_deref(), Some("details"));
}

#[tokio::test]
async fn delete_twice_second_fails_cleanly() {
    let (store, state) = board_with(vec![
        seed_task("1", "A", TaskStatus::Todo),
        seed_task("2", "B", TaskStatus::Todo),
    ])
    .await;
    store.fetch_all().await.unwrap();

    store.delete(&TaskId::new("1")).await.unwrap();
    assert_eq!(state.repo.len().await, 1);
    let after_first = store.items();

    let err = store.delete(&TaskId::new("1")).await.unwrap_err();
    assert!(matches!(err, StoreError::Client(ref e) if e.is_not_found()));
    assert_eq!(store.items(), after_first);
    assert!(store.error().is_some());
}

#[tokio::test]
async fn service_rejection_message_is_surfaced() {
    let (store, _) = board_with(vec![seed_task("1", "A", TaskStatus::Todo)]).await;
    let client = store.service();

    // Bypass local validation to see the service's own answer.
    let err = client
        .create(&seed_task("1", "duplicate", TaskStatus::Todo))
        .await
        .unwrap_err();
    match err {
        ClientError::Rejected { status, message } => {
            assert_eq!(status, 409);
            assert!(message.contains('1'));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn second_store_sees_first_stores_changes() {
    let (store, state) = board_with(Vec::new()).await;
    let added = store.add(TaskDraft::new("shared")).await.unwrap();

    let other = TaskStore::new(store.service().clone());
    other.fetch_all().await.unwrap();
    assert_eq!(other.items(), vec![added]);
    assert_eq!(state.repo.len().await, 1);
}
