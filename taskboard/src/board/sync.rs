//! Drag-gesture state machine over a board view.
//!
//! `BoardSync` keeps two tiers: the snapshot of the source collection last
//! passed to [`reconcile`](BoardSync::reconcile), and an optional
//! [`DragSession`] overlay that moves one card between columns while a
//! gesture is in progress. The snapshot is never changed by a gesture; the
//! only way a drag affects the source is the [`DragOutcome::Commit`] handed
//! back to the caller.

use taskboard_proto::task::{Task, TaskId, TaskStatus};

use super::partition::BoardView;

/// What a card is hovering over or dropped on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// A column.
    Column(TaskStatus),
    /// Another card; resolves to that card's column.
    Task(TaskId),
}

/// Result of ending a drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// The card landed in a different column; the caller should commit the
    /// status change.
    Commit {
        /// Dragged task.
        task_id: TaskId,
        /// Status before the gesture.
        from: TaskStatus,
        /// Status at the drop.
        to: TaskStatus,
    },
    /// Nothing to commit; the view is back on the snapshot.
    Revert,
}

/// Per-gesture overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    /// Dragged task.
    pub task_id: TaskId,
    /// Status in the snapshot when the gesture started.
    pub original_status: TaskStatus,
    /// Column the card is currently shown in.
    pub speculative_status: TaskStatus,
}

/// Keeps a [`BoardView`] in step with its source and with drag gestures.
#[derive(Debug, Clone, Default)]
pub struct BoardSync {
    snapshot: Vec<Task>,
    view: BoardView,
    session: Option<DragSession>,
}

impl BoardSync {
    /// Creates a synchronizer showing `tasks`.
    #[must_use]
    pub fn new(tasks: &[Task]) -> Self {
        Self {
            snapshot: tasks.to_vec(),
            view: BoardView::from_tasks(tasks),
            session: None,
        }
    }

    /// Current view, including any drag overlay.
    #[must_use]
    pub const fn view(&self) -> &BoardView {
        &self.view
    }

    /// Active drag gesture, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Returns `true` while a gesture is in progress.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Replaces the snapshot with `tasks` and rebuilds the view.
    ///
    /// An in-progress drag survives if its task is still present; otherwise
    /// the gesture is dropped.
    pub fn reconcile(&mut self, tasks: &[Task]) {
        self.snapshot = tasks.to_vec();
        self.view = BoardView::from_tasks(&self.snapshot);

        let Some(session) = self.session.take() else {
            tracing::debug!(count = tasks.len(), "board reconciled");
            return;
        };
        match self.snapshot_status(&session.task_id) {
            Some(status) => {
                let session = DragSession {
                    original_status: status,
                    ..session
                };
                if session.speculative_status != status {
                    self.view
                        .move_to_front(&session.task_id, session.speculative_status);
                }
                tracing::debug!(task_id = %session.task_id, "board reconciled mid-drag");
                self.session = Some(session);
            }
            None => {
                tracing::debug!(task_id = %session.task_id, "dragged task vanished, gesture dropped");
            }
        }
    }

    /// Starts dragging the task with `id`.
    ///
    /// Returns `false` (and does nothing) if a drag is already active or the
    /// task is not in the snapshot.
    pub fn drag_start(&mut self, id: &TaskId) -> bool {
        if self.session.is_some() {
            return false;
        }
        let Some(status) = self.snapshot_status(id) else {
            return false;
        };
        tracing::debug!(task_id = %id, %status, "drag started");
        self.session = Some(DragSession {
            task_id: id.clone(),
            original_status: status,
            speculative_status: status,
        });
        true
    }

    /// Moves the dragged card to the column `target` resolves to.
    ///
    /// Ignored when idle or when the target cannot be resolved.
    pub fn drag_over(&mut self, target: &DropTarget) {
        let Some(to) = self.resolve(target) else {
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.speculative_status == to {
            return;
        }
        if self.view.move_to_front(&session.task_id, to) {
            tracing::debug!(task_id = %session.task_id, from = %session.speculative_status, %to, "drag over");
            session.speculative_status = to;
        }
    }

    /// Ends the gesture and rebuilds the view from the snapshot.
    ///
    /// Yields [`DragOutcome::Commit`] only if the target resolves to a column
    /// other than the one the task started in.
    pub fn drag_end(&mut self, target: Option<&DropTarget>) -> DragOutcome {
        let to = target.and_then(|t| self.resolve(t));
        let Some(session) = self.session.take() else {
            return DragOutcome::Revert;
        };
        self.view = BoardView::from_tasks(&self.snapshot);

        match to {
            Some(to) if to != session.original_status => {
                tracing::debug!(task_id = %session.task_id, from = %session.original_status, %to, "drag committed");
                DragOutcome::Commit {
                    task_id: session.task_id,
                    from: session.original_status,
                    to,
                }
            }
            _ => {
                tracing::debug!(task_id = %session.task_id, "drag reverted");
                DragOutcome::Revert
            }
        }
    }

    /// Abandons any gesture without producing an outcome.
    pub fn cancel(&mut self) {
        if self.session.take().is_some() {
            self.view = BoardView::from_tasks(&self.snapshot);
        }
    }

    fn snapshot_status(&self, id: &TaskId) -> Option<TaskStatus> {
        self.snapshot.iter().find(|t| &t.id == id).map(|t| t.status)
    }

    /// Column a target stands for. Cards resolve through the snapshot, not
    /// the overlay.
    fn resolve(&self, target: &DropTarget) -> Option<TaskStatus> {
        match target {
            DropTarget::Column(status) => Some(*status),
            DropTarget::Task(id) => self.snapshot_status(id),
        }
    }
}
