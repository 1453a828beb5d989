//! Property-based tests for the filter/sort engine.
//!
//! Uses proptest to verify:
//! 1. Filtering returns an order-preserving subsequence of exactly the
//!    matching tasks.
//! 2. Empty filters are the identity.
//! 3. Sorting is a stable permutation in both directions.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use taskboard::tasks::{filter_tasks, matches, sort_tasks, visible_tasks};
use taskboard_proto::filters::{SortDirection, SortField, TaskFilters, TaskSort};
use taskboard_proto::task::{Task, TaskDraft, TaskId, TaskPriority, TaskStatus};

// --- Strategies ---

const WORDS: [&str; 6] = ["login", "Bug", "docs", "API", "deploy", "Cache"];

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

fn arb_priority() -> impl Strategy<Value = TaskPriority> {
    prop::sample::select(TaskPriority::ALL.to_vec())
}

/// Coarse timestamps so that ties are common.
fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4).prop_map(|day| Utc.timestamp_opt(1_700_000_000 + day * 86_400, 0).unwrap())
}

fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS.to_vec()), 1..4).prop_map(|w| w.join(" "))
}

/// Task without an id; ids are assigned by position.
fn arb_task_body() -> impl Strategy<Value = Task> {
    (
        arb_text(),
        arb_text(),
        arb_status(),
        arb_priority(),
        arb_instant(),
        arb_instant(),
    )
        .prop_map(|(title, description, status, priority, created, updated)| {
            let mut task = TaskDraft::new(title, description)
                .with_status(status)
                .with_priority(priority)
                .into_task(TaskId::from("pending"), created);
            task.updated_at = updated;
            task
        })
}

fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(arb_task_body(), 0..24).prop_map(|mut tasks| {
        for (i, task) in tasks.iter_mut().enumerate() {
            task.id = TaskId::from_string(format!("t{i}"));
        }
        tasks
    })
}

fn arb_filters() -> impl Strategy<Value = TaskFilters> {
    (
        prop::collection::btree_set(arb_status(), 0..=3),
        prop::option::of(arb_priority()),
        prop_oneof![
            Just(String::new()),
            prop::sample::select(WORDS.to_vec()).prop_map(str::to_lowercase),
            prop::sample::select(WORDS.to_vec()).prop_map(str::to_uppercase),
        ],
    )
        .prop_map(|(statuses, priority, search)| TaskFilters {
            statuses,
            priority,
            search,
        })
}

fn arb_sort() -> impl Strategy<Value = TaskSort> {
    (
        prop::sample::select(SortField::ALL.to_vec()),
        prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)],
    )
        .prop_map(|(field, direction)| TaskSort::new(field, direction))
}

// --- Helpers ---

fn key(task: &Task, field: SortField) -> i64 {
    match field {
        SortField::CreatedAt => task.created_at.timestamp(),
        SortField::UpdatedAt => task.updated_at.timestamp(),
        SortField::Priority => task.priority as i64,
    }
}

fn positions(tasks: &[Task]) -> HashMap<TaskId, usize> {
    tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.clone(), i))
        .collect()
}

// --- Properties ---

proptest! {
    #[test]
    fn filter_is_order_preserving_subset(tasks in arb_tasks(), filters in arb_filters()) {
        let out = filter_tasks(&tasks, &filters);
        let expected: Vec<Task> = tasks.iter().filter(|t| matches(t, &filters)).cloned().collect();
        prop_assert_eq!(&out, &expected);

        let index = positions(&tasks);
        for pair in out.windows(2) {
            prop_assert!(index[&pair[0].id] < index[&pair[1].id]);
        }
    }

    #[test]
    fn empty_filters_are_identity(tasks in arb_tasks()) {
        prop_assert_eq!(filter_tasks(&tasks, &TaskFilters::default()), tasks);
    }

    #[test]
    fn sort_is_stable_permutation(tasks in arb_tasks(), sort in arb_sort()) {
        let out = sort_tasks(&tasks, &sort);
        prop_assert_eq!(out.len(), tasks.len());

        let mut in_ids: Vec<_> = tasks.iter().map(|t| t.id.clone()).collect();
        let mut out_ids: Vec<_> = out.iter().map(|t| t.id.clone()).collect();
        in_ids.sort();
        out_ids.sort();
        prop_assert_eq!(in_ids, out_ids);

        let index = positions(&tasks);
        for pair in out.windows(2) {
            let (a, b) = (key(&pair[0], sort.field), key(&pair[1], sort.field));
            match sort.direction {
                SortDirection::Asc => prop_assert!(a <= b),
                SortDirection::Desc => prop_assert!(a >= b),
            }
            if a == b {
                prop_assert!(index[&pair[0].id] < index[&pair[1].id]);
            }
        }
    }

    #[test]
    fn visible_tasks_is_sort_of_filter(tasks in arb_tasks(), filters in arb_filters(), sort in arb_sort()) {
        prop_assert_eq!(
            visible_tasks(&tasks, &filters, &sort),
            sort_tasks(&filter_tasks(&tasks, &filters), &sort)
        );
    }
}

// --- Scenarios ---

#[test]
fn backlog_filter_with_priority_sort_keeps_task_one() {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let tasks = vec![
        TaskDraft::new("One", "first")
            .with_status(TaskStatus::Backlog)
            .with_priority(TaskPriority::High)
            .into_task(TaskId::from("1"), at),
        TaskDraft::new("Two", "second")
            .with_status(TaskStatus::Done)
            .with_priority(TaskPriority::Low)
            .into_task(TaskId::from("2"), at),
    ];

    let mut filters = TaskFilters::default();
    filters.statuses.insert(TaskStatus::Backlog);
    let sort = TaskSort::new(SortField::Priority, SortDirection::Desc);
    let visible = visible_tasks(&tasks, &filters, &sort);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id.as_str(), "1");

    let all = sort_tasks(&tasks, &sort);
    let ids: Vec<_> = all.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
}
