//! Authoritative task collection and its derived views.
//!
//! [`TaskManager`] owns the one mutable copy of the task list and persists
//! every change through the storage layer. The [`query`] functions derive
//! filtered and sorted views from it without retaining anything.

pub mod manager;
pub mod query;

pub use manager::{PersistenceMode, StorageWarning, TaskManager, TaskObserver};
pub use query::{filter_tasks, matches, sort_tasks, visible_tasks};

use taskboard_proto::task::TaskId;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur during task operations.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Task with the given ID was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The change was applied in memory but could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
