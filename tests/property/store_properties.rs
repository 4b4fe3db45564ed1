//! Property tests for the task store.
//!
//! Runs random operation sequences against a `MemoryService` (with random
//! injected rejections) and checks after every step:
//! 1. Task ids in `items` stay unique.
//! 2. `loading` is false once nothing is in flight.
//! 3. A failed operation leaves `items` exactly as before.
//! 4. After a successful fetch, `items` equals the service's collection.
//! 5. The column projection partitions `items` by status, in order.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashSet;

use proptest::prelude::*;
use taskboard::client::MemoryService;
use taskboard::tasks::{TaskStore, by_status, columns};
use taskboard_proto::task::{Task, TaskDraft, TaskId, TaskPatch, TaskStatus};

#[derive(Debug, Clone)]
enum Op {
    Fetch,
    Add(String),
    Update(usize, String),
    Delete(usize),
    Move(usize, TaskStatus),
    /// Next service call is rejected.
    Reject,
}

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Todo),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Done),
    ]
}

/// Titles are occasionally empty to exercise local validation.
fn arb_title() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z ]{1,12}",
        1 => Just(String::new()),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Fetch),
        arb_title().prop_map(Op::Add),
        (0..8usize, arb_title()).prop_map(|(i, t)| Op::Update(i, t)),
        (0..8usize).prop_map(Op::Delete),
        (0..8usize, arb_status()).prop_map(|(i, s)| Op::Move(i, s)),
        Just(Op::Reject),
    ]
}

/// Picks a target id: an existing local task when `index` is in range,
/// otherwise an id nobody has.
fn target(items: &[Task], index: usize) -> TaskId {
    items
        .get(index)
        .map_or_else(|| TaskId::new(format!("absent-{index}")), |t| t.id.clone())
}

fn run(ops: &[Op]) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    rt.block_on(async {
        let service = MemoryService::new();
        let store = TaskStore::new(service.clone());

        for op in ops {
            let before = store.items();
            let succeeded = match op {
                Op::Fetch => store.fetch_all().await.is_ok(),
                Op::Add(title) => store.add(TaskDraft::new(title.clone())).await.is_ok(),
                Op::Update(i, title) => {
                    let patch = TaskPatch {
                        title: Some(title.clone()),
                        ..TaskPatch::default()
                    };
                    store.update(&target(&before, *i), &patch).await.is_ok()
                }
                Op::Delete(i) => store.delete(&target(&before, *i)).await.is_ok(),
                Op::Move(i, status) => store.move_task(&target(&before, *i), *status).await.is_ok(),
                Op::Reject => {
                    service.reject_next(503, "unavailable");
                    continue;
                }
            };

            let state = store.snapshot();
            assert!(!state.loading, "loading left raised after {op:?}");

            let ids: HashSet<&TaskId> = state.items.iter().map(|t| &t.id).collect();
            assert_eq!(ids.len(), state.items.len(), "duplicate ids after {op:?}");

            if succeeded {
                assert_eq!(state.error, None);
            } else {
                assert_eq!(state.items, before, "failed {op:?} changed items");
                assert!(state.error.is_some());
            }

            if succeeded && matches!(op, Op::Fetch) {
                assert_eq!(state.items, service.tasks());
            }

            let cols = columns(&state);
            let total: usize = cols.iter().map(|c| c.tasks.len()).sum();
            assert_eq!(total, state.items.len());
            for status in TaskStatus::ALL {
                let expected: Vec<&Task> =
                    state.items.iter().filter(|t| t.status == status).collect();
                assert_eq!(by_status(&state, status), expected);
            }
        }

        // A single store with no other writers stays in step with its service.
        if store.fetch_all().await.is_ok() {
            assert_eq!(store.items(), service.tasks());
        }
    });
}

proptest! {
    #[test]
    fn store_invariants_hold(ops in prop::collection::vec(arb_op(), 1..40)) {
        run(&ops);
    }
}
