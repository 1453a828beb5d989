//! Per-status partition of a task list.

use taskboard_proto::task::{Task, TaskId, TaskStatus};

const fn column_index(status: TaskStatus) -> usize {
    match status {
        TaskStatus::Backlog => 0,
        TaskStatus::InProgress => 1,
        TaskStatus::Done => 2,
    }
}

/// Tasks grouped into one column per [`TaskStatus`].
///
/// Every task appears in exactly one column. Within a column, tasks keep
/// the order of the list the view was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardView {
    columns: [Vec<Task>; 3],
}

impl BoardView {
    /// Partitions `tasks` by status, preserving source order.
    #[must_use]
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut view = Self::default();
        for task in tasks {
            view.columns[column_index(task.status)].push(task.clone());
        }
        view
    }

    /// Tasks in the `status` column.
    #[must_use]
    pub fn column(&self, status: TaskStatus) -> &[Task] {
        &self.columns[column_index(status)]
    }

    /// Columns in board order, paired with their status.
    pub fn columns(&self) -> impl Iterator<Item = (TaskStatus, &[Task])> {
        TaskStatus::ALL
            .into_iter()
            .map(move |status| (status, self.column(status)))
    }

    /// Column currently holding the task with `id`.
    #[must_use]
    pub fn status_of(&self, id: &TaskId) -> Option<TaskStatus> {
        self.columns()
            .find(|(_, tasks)| tasks.iter().any(|t| &t.id == id))
            .map(|(status, _)| status)
    }

    /// Total number of tasks across all columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    /// Returns `true` if every column is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(Vec::is_empty)
    }

    /// Takes the task with `id` out of its column and puts it, with its
    /// status rewritten, at the head of the `to` column.
    ///
    /// Returns `false` if the task is not on the board.
    pub(crate) fn move_to_front(&mut self, id: &TaskId, to: TaskStatus) -> bool {
        let Some(from) = self.status_of(id) else {
            return false;
        };
        let column = &mut self.columns[column_index(from)];
        let Some(pos) = column.iter().position(|t| &t.id == id) else {
            return false;
        };
        let mut task = column.remove(pos);
        task.status = to;
        self.columns[column_index(to)].insert(0, task);
        true
    }
}
