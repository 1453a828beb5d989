//! Integration tests for drag-driven status changes.
//!
//! Drives full gestures through `App`: the board overlay during a drag, the
//! commit into the task manager, and reconciliation of the board from the
//! updated collection.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{DateTime, TimeZone, Utc};
use taskboard::app::App;
use taskboard::board::{DragOutcome, DropTarget};
use taskboard::clock::FixedClock;
use taskboard::storage::{InMemoryKvStore, TaskStorage};
use taskboard::tasks::TaskManager;
use taskboard_proto::task::{Task, TaskDraft, TaskId, TaskStatus};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn created() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn dropped() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 2, 17, 30, 0).unwrap()
}

fn task(id: &str, status: TaskStatus) -> Task {
    TaskDraft::new(format!("Task {id}"), "details")
        .with_status(status)
        .into_task(TaskId::from(id), created())
}

/// App over a store pre-loaded with `tasks`, with the clock at `dropped()`.
fn make_app<'a>(store: &'a InMemoryKvStore, tasks: &[Task]) -> App<&'a InMemoryKvStore, FixedClock> {
    let storage = TaskStorage::with_clock(store, FixedClock::new(dropped()));
    storage.save(tasks).unwrap();
    App::new(TaskManager::open(storage))
}

fn ids(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.id.as_str()).collect()
}

// ===========================================================================
// Commit and reconcile
// ===========================================================================

#[test]
fn backlog_to_done_commit_reconciles_board() {
    let store = InMemoryKvStore::new();
    let mut app = make_app(
        &store,
        &[task("A", TaskStatus::Backlog), task("B", TaskStatus::Done)],
    );
    let a = TaskId::from("A");

    assert!(app.drag_start(&a));
    app.drag_over(&DropTarget::Column(TaskStatus::Done));
    assert_eq!(ids(app.board().column(TaskStatus::Done)), vec!["A", "B"]);
    assert!(app.board().column(TaskStatus::Backlog).is_empty());
    // Nothing is committed while hovering.
    assert_eq!(app.manager().get(&a).unwrap().status, TaskStatus::Backlog);

    let outcome = app
        .drag_end(Some(&DropTarget::Column(TaskStatus::Done)))
        .unwrap();
    assert_eq!(
        outcome,
        DragOutcome::Commit {
            task_id: a.clone(),
            from: TaskStatus::Backlog,
            to: TaskStatus::Done,
        }
    );

    let moved = app.manager().get(&a).unwrap();
    assert_eq!(moved.status, TaskStatus::Done);
    assert_eq!(moved.updated_at, dropped());
    assert_eq!(moved.created_at, created());

    let done = app.board().column(TaskStatus::Done);
    assert_eq!(done.len(), 2);
    assert!(done.iter().any(|t| t.id == a));
    assert!(app.board().column(TaskStatus::Backlog).is_empty());

    // Persisted as well.
    let reopened = TaskManager::open(TaskStorage::with_clock(&store, FixedClock::new(dropped())));
    assert_eq!(reopened.get(&a).unwrap().status, TaskStatus::Done);
}

#[test]
fn drop_on_card_takes_that_cards_column() {
    let store = InMemoryKvStore::new();
    let mut app = make_app(
        &store,
        &[task("A", TaskStatus::Backlog), task("B", TaskStatus::InProgress)],
    );

    app.drag_start(&TaskId::from("A"));
    app.drag_over(&DropTarget::Task(TaskId::from("B")));
    let outcome = app
        .drag_end(Some(&DropTarget::Task(TaskId::from("B"))))
        .unwrap();
    assert!(matches!(
        outcome,
        DragOutcome::Commit { to: TaskStatus::InProgress, .. }
    ));
    assert_eq!(
        ids(app.board().column(TaskStatus::InProgress)).len(),
        2
    );
}

// ===========================================================================
// Reverts
// ===========================================================================

#[test]
fn drop_outside_any_target_reverts() {
    let store = InMemoryKvStore::new();
    let mut app = make_app(&store, &[task("A", TaskStatus::Backlog)]);
    let version = app.manager().version();

    app.drag_start(&TaskId::from("A"));
    app.drag_over(&DropTarget::Column(TaskStatus::InProgress));
    assert_eq!(app.drag_end(None).unwrap(), DragOutcome::Revert);

    assert_eq!(app.manager().version(), version);
    assert_eq!(ids(app.board().column(TaskStatus::Backlog)), vec!["A"]);
    assert!(app.board().column(TaskStatus::InProgress).is_empty());
}

#[test]
fn drop_back_on_original_column_reverts() {
    let store = InMemoryKvStore::new();
    let mut app = make_app(&store, &[task("A", TaskStatus::Done)]);

    app.drag_start(&TaskId::from("A"));
    app.drag_over(&DropTarget::Column(TaskStatus::Backlog));
    app.drag_over(&DropTarget::Column(TaskStatus::Done));
    let outcome = app
        .drag_end(Some(&DropTarget::Column(TaskStatus::Done)))
        .unwrap();
    assert_eq!(outcome, DragOutcome::Revert);
    assert_eq!(
        app.manager().get(&TaskId::from("A")).unwrap().updated_at,
        created()
    );
}

#[test]
fn unknown_task_cannot_be_dragged() {
    let store = InMemoryKvStore::new();
    let mut app = make_app(&store, &[task("A", TaskStatus::Done)]);
    assert!(!app.drag_start(&TaskId::from("ghost")));
    assert_eq!(
        app.drag_end(Some(&DropTarget::Column(TaskStatus::Backlog)))
            .unwrap(),
        DragOutcome::Revert
    );
}

// ===========================================================================
// Interaction with filters and storage
// ===========================================================================

#[test]
fn moved_task_leaves_a_filtered_board() {
    let store = InMemoryKvStore::new();
    let mut app = make_app(
        &store,
        &[task("A", TaskStatus::Backlog), task("B", TaskStatus::Backlog)],
    );
    app.set_query("status=Backlog");
    assert_eq!(app.board().len(), 2);

    app.drag_start(&TaskId::from("A"));
    app.drag_end(Some(&DropTarget::Column(TaskStatus::Done)))
        .unwrap();
    assert_eq!(ids(app.board().column(TaskStatus::Backlog)), vec!["B"]);
    assert!(app.board().column(TaskStatus::Done).is_empty());
}

#[test]
fn memory_only_board_still_commits_drags() {
    let store = InMemoryKvStore::new();
    store.set_unavailable(true);
    let storage = TaskStorage::with_clock(&store, FixedClock::new(dropped()));
    let mut app = App::new(TaskManager::open(storage));
    assert!(app.warning().is_some());

    let id = app.add_task(TaskDraft::new("Offline", "not saved")).unwrap();
    app.drag_start(&id);
    let outcome = app
        .drag_end(Some(&DropTarget::Column(TaskStatus::InProgress)))
        .unwrap();
    assert!(matches!(outcome, DragOutcome::Commit { .. }));
    assert_eq!(app.board().column(TaskStatus::InProgress).len(), 1);
    assert!(store.is_empty());
}
