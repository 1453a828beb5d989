//! Application state: the task collection, the current view, and the board.

use taskboard_proto::filters::TaskSort;
use taskboard_proto::params::{self, QueryParams, ViewState};
use taskboard_proto::task::{Task, TaskDraft, TaskId, TaskPatch, TaskStatus};

use crate::board::{BoardSync, BoardView, DragOutcome, DropTarget};
use crate::clock::{Clock, SystemClock};
use crate::storage::KeyValueStore;
use crate::tasks::{self, StorageWarning, TaskError, TaskManager};

/// Main application state.
///
/// Every change to the collection or to the view criteria re-derives the
/// board from the visible (filtered and sorted) tasks.
pub struct App<S, C = SystemClock> {
    manager: TaskManager<S, C>,
    view: ViewState,
    board: BoardSync,
}

impl<S: KeyValueStore, C: Clock> App<S, C> {
    /// Creates the app over an opened manager with the default view.
    pub fn new(manager: TaskManager<S, C>) -> Self {
        let mut app = Self {
            manager,
            view: ViewState::default(),
            board: BoardSync::default(),
        };
        app.refresh_board();
        app
    }

    /// Authoritative task manager.
    #[must_use]
    pub const fn manager(&self) -> &TaskManager<S, C> {
        &self.manager
    }

    /// Mutable access for subscribing observers.
    pub const fn manager_mut(&mut self) -> &mut TaskManager<S, C> {
        &mut self.manager
    }

    /// Current filter and sort criteria.
    #[must_use]
    pub const fn view_state(&self) -> &ViewState {
        &self.view
    }

    /// Outstanding storage warning, if any.
    #[must_use]
    pub const fn warning(&self) -> Option<&StorageWarning> {
        self.manager.warning()
    }

    /// Replaces the view criteria with those decoded from `query`.
    pub fn set_query(&mut self, query: &str) {
        self.view = params::decode(&QueryParams::parse(query));
        tracing::debug!(query, "view criteria changed");
        self.refresh_board();
    }

    /// Replaces the view criteria directly.
    pub fn set_view(&mut self, view: ViewState) {
        self.view = view;
        self.refresh_board();
    }

    /// Shareable query string for the current criteria.
    #[must_use]
    pub fn query_string(&self) -> String {
        params::encode(&self.view.filters, &self.view.sort).to_query_string()
    }

    /// Resets every filter, keeping the sort.
    pub fn clear_filters(&mut self) {
        let sort: TaskSort = self.view.sort;
        self.view = ViewState {
            sort,
            ..ViewState::default()
        };
        self.refresh_board();
    }

    /// Filtered and sorted tasks.
    #[must_use]
    pub fn visible_tasks(&self) -> Vec<Task> {
        tasks::visible_tasks(self.manager.tasks(), &self.view.filters, &self.view.sort)
    }

    /// Board view of the visible tasks, including any drag overlay.
    #[must_use]
    pub const fn board(&self) -> &BoardView {
        self.board.view()
    }

    /// Starts a drag gesture; see [`BoardSync::drag_start`].
    pub fn drag_start(&mut self, id: &TaskId) -> bool {
        self.board.drag_start(id)
    }

    /// Hovers the dragged card; see [`BoardSync::drag_over`].
    pub fn drag_over(&mut self, target: &DropTarget) {
        self.board.drag_over(target);
    }

    /// Ends the gesture, committing a status change if the card moved.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError`] if the committed change could not be applied or
    /// saved. The board is reconciled either way.
    pub fn drag_end(&mut self, target: Option<&DropTarget>) -> Result<DragOutcome, TaskError> {
        let outcome = self.board.drag_end(target);
        if let DragOutcome::Commit { task_id, to, .. } = &outcome {
            let result = self.manager.set_status(task_id, *to);
            self.refresh_board();
            result?;
        }
        Ok(outcome)
    }

    /// Adds a task; see [`TaskManager::add_task`].
    ///
    /// # Errors
    ///
    /// See [`TaskManager::add_task`].
    pub fn add_task(&mut self, draft: TaskDraft) -> Result<TaskId, TaskError> {
        let result = self.manager.add_task(draft);
        self.refresh_board();
        result
    }

    /// Edits a task; see [`TaskManager::update_task`].
    ///
    /// # Errors
    ///
    /// See [`TaskManager::update_task`].
    pub fn update_task(&mut self, id: &TaskId, patch: TaskPatch) -> Result<(), TaskError> {
        let result = self.manager.update_task(id, patch);
        self.refresh_board();
        result
    }

    /// Changes a task's status without a drag; see
    /// [`TaskManager::set_status`].
    ///
    /// # Errors
    ///
    /// See [`TaskManager::set_status`].
    pub fn set_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<(), TaskError> {
        let result = self.manager.set_status(id, status);
        self.refresh_board();
        result
    }

    /// Deletes a task; see [`TaskManager::delete_task`].
    ///
    /// # Errors
    ///
    /// See [`TaskManager::delete_task`].
    pub fn delete_task(&mut self, id: &TaskId) -> Result<(), TaskError> {
        let result = self.manager.delete_task(id);
        self.refresh_board();
        result
    }

    fn refresh_board(&mut self) {
        let visible = self.visible_tasks();
        self.board.reconcile(&visible);
    }
}
