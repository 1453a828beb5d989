//! Filter/sort engine: pure derivations of a task view.
//!
//! Nothing here retains state or mutates its input; callers recompute
//! whenever the source collection or the criteria change.

use std::cmp::Ordering;

use taskboard_proto::filters::{SortDirection, SortField, TaskFilters, TaskSort};
use taskboard_proto::task::Task;

/// Returns `true` if `task` satisfies every predicate in `filters`.
#[must_use]
pub fn matches(task: &Task, filters: &TaskFilters) -> bool {
    if !filters.statuses.is_empty() && !filters.statuses.contains(&task.status) {
        return false;
    }

    if filters.priority.is_some_and(|p| p != task.priority) {
        return false;
    }

    if !filters.search.is_empty() {
        let needle = filters.search.to_lowercase();
        let in_title = task.title.to_lowercase().contains(&needle);
        let in_description = task.description.to_lowercase().contains(&needle);
        if !in_title && !in_description {
            return false;
        }
    }

    true
}

/// Keeps the tasks matching `filters`, preserving their relative order.
#[must_use]
pub fn filter_tasks(tasks: &[Task], filters: &TaskFilters) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| matches(task, filters))
        .cloned()
        .collect()
}

/// Ascending comparison of two tasks on `field`.
fn compare(a: &Task, b: &Task, field: SortField) -> Ordering {
    match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Priority => a.priority.cmp(&b.priority),
    }
}

/// Returns a stably sorted copy of `tasks`.
///
/// `Desc` flips the comparator rather than the output, so tasks with equal
/// keys keep their input order in both directions.
#[must_use]
pub fn sort_tasks(tasks: &[Task], sort: &TaskSort) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| {
        let ord = compare(a, b, sort.field);
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    sorted
}

/// Filtered then sorted view, as shown on the board page.
#[must_use]
pub fn visible_tasks(tasks: &[Task], filters: &TaskFilters, sort: &TaskSort) -> Vec<Task> {
    sort_tasks(&filter_tasks(tasks, filters), sort)
}
