//! Task manager: the single owned, versioned task collection.
//!
//! `TaskManager` applies every create, edit, status change and delete to its
//! in-memory list first, notifies observers, and then writes the whole list
//! through [`TaskStorage`]. A failed write never rolls the change back; it
//! is surfaced as a [`StorageWarning`] and as the operation's error.

use taskboard_proto::task::{Task, TaskDraft, TaskId, TaskPatch, TaskStatus};

use super::TaskError;
use crate::clock::{Clock, SystemClock};
use crate::storage::{KeyValueStore, LoadOutcome, TaskStorage};

/// Non-blocking problem with persistence, meant to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageWarning {
    /// The store could not be used at all; changes live in memory only.
    #[error("storage is not available, your data will not be persisted: {0}")]
    Unavailable(String),

    /// The most recent save was rejected.
    #[error("failed to save tasks to storage: {0}")]
    WriteFailed(String),
}

/// Whether the manager was able to open its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceMode {
    /// Changes are written through to the store.
    Durable,
    /// The store failed its probe at open; nothing is written.
    MemoryOnly,
}

/// Receives change notifications from a [`TaskManager`].
///
/// Every method defaults to a no-op so observers only implement what they
/// care about.
pub trait TaskObserver {
    /// The collection changed; `version` is the new collection version.
    fn on_tasks_changed(&self, _tasks: &[Task], _version: u64) {}

    /// A status change was committed in memory.
    fn on_status_committed(&self, _task_id: &TaskId, _status: TaskStatus) {}

    /// A storage warning was raised.
    fn on_storage_warning(&self, _warning: &StorageWarning) {}
}

/// Owns the authoritative task list and persists it on every change.
pub struct TaskManager<S, C = SystemClock> {
    storage: TaskStorage<S, C>,
    tasks: Vec<Task>,
    version: u64,
    mode: PersistenceMode,
    warning: Option<StorageWarning>,
    migrated: bool,
    seeded: bool,
    observers: Vec<Box<dyn TaskObserver>>,
}

impl<S: KeyValueStore, C: Clock> TaskManager<S, C> {
    /// Opens the collection held by `storage`.
    ///
    /// If the store passes its availability probe the tasks are loaded
    /// (migrating or seeding as needed). Otherwise the manager starts empty
    /// in [`PersistenceMode::MemoryOnly`] with a
    /// [`StorageWarning::Unavailable`] warning.
    pub fn open(storage: TaskStorage<S, C>) -> Self {
        match storage.probe() {
            Ok(()) => {
                let outcome = storage.load();
                Self::from_outcome(storage, outcome)
            }
            Err(e) => Self::memory_only(storage, &e.to_string()),
        }
    }

    /// [`open`](Self::open) with an explicit random source for seeding.
    pub fn open_with_rng<R: rand::Rng + ?Sized>(storage: TaskStorage<S, C>, rng: &mut R) -> Self {
        match storage.probe() {
            Ok(()) => {
                let outcome = storage.load_with_rng(rng);
                Self::from_outcome(storage, outcome)
            }
            Err(e) => Self::memory_only(storage, &e.to_string()),
        }
    }

    fn from_outcome(storage: TaskStorage<S, C>, outcome: LoadOutcome) -> Self {
        tracing::info!(
            count = outcome.tasks.len(),
            migrated = outcome.migrated,
            seeded = outcome.seeded,
            "opened task collection"
        );
        Self {
            storage,
            tasks: outcome.tasks,
            version: 0,
            mode: PersistenceMode::Durable,
            warning: None,
            migrated: outcome.migrated,
            seeded: outcome.seeded,
            observers: Vec::new(),
        }
    }

    fn memory_only(storage: TaskStorage<S, C>, reason: &str) -> Self {
        tracing::warn!(error = %reason, "storage unavailable, running memory-only");
        Self {
            storage,
            tasks: Vec::new(),
            version: 0,
            mode: PersistenceMode::MemoryOnly,
            warning: Some(StorageWarning::Unavailable(reason.to_string())),
            migrated: false,
            seeded: false,
            observers: Vec::new(),
        }
    }

    /// Current tasks, newest first.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Collection version; bumped on every applied change.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// `true` if the stored document was upgraded when the manager opened.
    #[must_use]
    pub const fn migrated(&self) -> bool {
        self.migrated
    }

    /// `true` if the manager opened onto a fresh seed set.
    #[must_use]
    pub const fn seeded(&self) -> bool {
        self.seeded
    }

    /// Persistence mode chosen at open.
    #[must_use]
    pub const fn mode(&self) -> PersistenceMode {
        self.mode
    }

    /// The outstanding storage warning, if any.
    #[must_use]
    pub const fn warning(&self) -> Option<&StorageWarning> {
        self.warning.as_ref()
    }

    /// Underlying storage.
    #[must_use]
    pub const fn storage(&self) -> &TaskStorage<S, C> {
        &self.storage
    }

    /// Registers an observer for change notifications.
    pub fn subscribe(&mut self, observer: Box<dyn TaskObserver>) {
        self.observers.push(observer);
    }

    /// Creates a task from `draft` at the front of the list.
    ///
    /// The draft is expected to be validated by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Storage`] if the task was added but could not be
    /// saved.
    pub fn add_task(&mut self, draft: TaskDraft) -> Result<TaskId, TaskError> {
        let task = draft.into_task(TaskId::new(), self.storage.now());
        let id = task.id.clone();
        tracing::debug!(task_id = %id, "adding task");
        self.tasks.insert(0, task);
        self.commit()?;
        Ok(id)
    }

    /// Applies `patch` to the task with `id` and refreshes its `updatedAt`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::TaskNotFound`] if no such task exists, or
    /// [`TaskError::Storage`] if the edit could not be saved.
    pub fn update_task(&mut self, id: &TaskId, patch: TaskPatch) -> Result<(), TaskError> {
        let now = self.storage.now();
        let task = self.get_mut(id)?;
        patch.apply(task, now);
        tracing::debug!(task_id = %id, "updated task");
        self.commit()
    }

    /// Moves the task with `id` to `status`.
    ///
    /// Observers get [`TaskObserver::on_status_committed`] once the change is
    /// in memory, before it is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::TaskNotFound`] if no such task exists, or
    /// [`TaskError::Storage`] if the change could not be saved.
    pub fn set_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<(), TaskError> {
        let now = self.storage.now();
        let task = self.get_mut(id)?;
        let from = task.status;
        TaskPatch::status_only(status).apply(task, now);
        tracing::debug!(task_id = %id, %from, to = %status, "status committed");
        self.bump();
        for observer in &self.observers {
            observer.on_status_committed(id, status);
        }
        self.persist()
    }

    /// Removes the task with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::TaskNotFound`] if no such task exists, or
    /// [`TaskError::Storage`] if the removal could not be saved.
    pub fn delete_task(&mut self, id: &TaskId) -> Result<(), TaskError> {
        let index = self
            .tasks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| TaskError::TaskNotFound(id.clone()))?;
        self.tasks.remove(index);
        tracing::debug!(task_id = %id, "deleted task");
        self.commit()
    }

    fn get_mut(&mut self, id: &TaskId) -> Result<&mut Task, TaskError> {
        self.tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| TaskError::TaskNotFound(id.clone()))
    }

    fn commit(&mut self) -> Result<(), TaskError> {
        self.bump();
        self.persist()
    }

    fn bump(&mut self) {
        self.version += 1;
        for observer in &self.observers {
            observer.on_tasks_changed(&self.tasks, self.version);
        }
    }

    /// Writes the collection if the store is usable. An unusable store is a
    /// warning, a rejected write is a warning and an error.
    fn persist(&mut self) -> Result<(), TaskError> {
        if self.mode == PersistenceMode::MemoryOnly {
            return Ok(());
        }
        if let Err(e) = self.storage.probe() {
            self.raise(StorageWarning::Unavailable(e.to_string()));
            return Ok(());
        }
        match self.storage.save(&self.tasks) {
            Ok(()) => {
                self.warning = None;
                Ok(())
            }
            Err(e) => {
                self.raise(StorageWarning::WriteFailed(e.to_string()));
                Err(e.into())
            }
        }
    }

    fn raise(&mut self, warning: StorageWarning) {
        tracing::warn!(%warning, "storage warning");
        for observer in &self.observers {
            observer.on_storage_warning(&warning);
        }
        self.warning = Some(warning);
    }
}
