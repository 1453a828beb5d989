//! Persistence layer: the system of record for the task collection.
//!
//! [`TaskStorage`] reads and writes one [`StorageDocument`] under a single
//! key of a [`KeyValueStore`]. Loading fails open: a missing, corrupt or
//! unmigratable document is replaced with freshly seeded sample tasks, and
//! the caller always gets a task list back. Saving fails loud: a rejected
//! write is returned as [`StorageError::WriteFailure`].

pub mod kv;
pub mod migrate;
pub mod seed;

pub use kv::{FileKvStore, InMemoryKvStore, KeyValueStore, KvError};
pub use migrate::{MigrationError, MigrationStep, migrate};
pub use seed::{SEED_TASK_COUNT, generate_seed_tasks};

use taskboard_proto::storage::StorageDocument;
use taskboard_proto::task::Task;

use crate::clock::{Clock, SystemClock};

/// Key the document is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "task-manager-data";

/// Throwaway key used by [`TaskStorage::is_available`].
const PROBE_KEY: &str = "__storage_test__";

/// Failures of the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The store cannot be probed; the board runs memory-only.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The stored document cannot be parsed.
    #[error("stored document is corrupt: {0}")]
    ReadCorrupt(String),

    /// The store rejected a write.
    #[error("failed to save tasks: {0}")]
    WriteFailure(#[source] KvError),

    /// A migrated record is still missing required fields.
    #[error("migration left an invalid record: {0}")]
    MigrationInvariantViolation(String),
}

impl From<MigrationError> for StorageError {
    fn from(err: MigrationError) -> Self {
        match err {
            MigrationError::Invariant(msg) => Self::MigrationInvariantViolation(msg),
            other => Self::ReadCorrupt(other.to_string()),
        }
    }
}

/// What [`TaskStorage::load`] found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    /// The task collection, never absent.
    pub tasks: Vec<Task>,
    /// `true` if an older schema was upgraded during this load.
    pub migrated: bool,
    /// `true` if the tasks are a fresh seed set (empty or unreadable store).
    pub seeded: bool,
}

/// Reads and writes the task document in a key-value store.
pub struct TaskStorage<S, C = SystemClock> {
    store: S,
    clock: C,
    key: String,
}

impl<S: KeyValueStore> TaskStorage<S> {
    /// Creates a storage over `store` using the default key and the system
    /// clock.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> TaskStorage<S, C> {
    /// Creates a storage with an explicit clock.
    #[must_use]
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    /// Overrides the record key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Record key in use.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Current time according to the storage clock.
    #[must_use]
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Loads the task collection, migrating or reseeding as needed.
    ///
    /// Never fails. Migrated and seeded collections are written back
    /// immediately; if that write fails the data is still returned and the
    /// failure is only logged.
    pub fn load(&self) -> LoadOutcome {
        self.load_with_rng(&mut rand::rng())
    }

    /// [`load`](Self::load) with an explicit random source for seeding.
    pub fn load_with_rng<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> LoadOutcome {
        match self.read_document() {
            Ok(Some((document, migrated))) => {
                if migrated {
                    tracing::info!(
                        key = %self.key,
                        count = document.tasks.len(),
                        "migrated stored tasks to current schema"
                    );
                    self.persist_quietly(&document.tasks, "migrated");
                } else {
                    tracing::debug!(key = %self.key, count = document.tasks.len(), "loaded tasks");
                }
                LoadOutcome {
                    tasks: document.tasks,
                    migrated,
                    seeded: false,
                }
            }
            Ok(None) => {
                tracing::info!(key = %self.key, "store empty, seeding sample tasks");
                self.reseed(rng)
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "discarding unreadable tasks, reseeding");
                self.reseed(rng)
            }
        }
    }

    /// Writes `tasks` as a current-version document in one `set`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::WriteFailure`] if the store rejects the write.
    pub fn save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        let document = StorageDocument::current(tasks.to_vec());
        let json = serde_json::to_string(&document)
            .map_err(|e| StorageError::WriteFailure(KvError::Io(std::io::Error::other(e))))?;
        self.store.set(&self.key, &json).map_err(|e| {
            tracing::warn!(key = %self.key, error = %e, "failed to save tasks");
            StorageError::WriteFailure(e)
        })
    }

    /// Probes the store with a throwaway write and delete.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.probe().is_ok()
    }

    /// Probes the store, reporting why it is unusable.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if the probe write or delete
    /// fails.
    pub fn probe(&self) -> Result<(), StorageError> {
        self.store
            .set(PROBE_KEY, PROBE_KEY)
            .and_then(|()| self.store.remove(PROBE_KEY))
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }

    /// Reads and migrates the stored document. `Ok(None)` means the store
    /// holds nothing under the key.
    fn read_document(&self) -> Result<Option<(StorageDocument, bool)>, StorageError> {
        let raw = self
            .store
            .get(&self.key)
            .map_err(|e| StorageError::ReadCorrupt(e.to_string()))?;
        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            return Ok(None);
        };
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| StorageError::ReadCorrupt(e.to_string()))?;
        let migrated = migrate(value, self.clock.now())?;
        Ok(Some((migrated.document, migrated.migrated)))
    }

    fn reseed<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> LoadOutcome {
        let tasks = generate_seed_tasks(rng, self.clock.now());
        self.persist_quietly(&tasks, "seeded");
        LoadOutcome {
            tasks,
            migrated: false,
            seeded: true,
        }
    }

    fn persist_quietly(&self, tasks: &[Task], what: &str) {
        if let Err(e) = self.save(tasks) {
            tracing::warn!(key = %self.key, error = %e, "{what} tasks could not be persisted");
        }
    }
}
