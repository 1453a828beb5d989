//! Durable document envelope.

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Version assumed for documents that carry no `schemaVersion` field.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

/// The whole persisted state: a version tag and every task.
///
/// Always written as one unit; there are no partial updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDocument {
    /// Field layout version of `tasks`.
    pub schema_version: u32,
    /// All tasks, in collection order.
    pub tasks: Vec<Task>,
}

impl StorageDocument {
    /// Wraps `tasks` in a document stamped with [`CURRENT_SCHEMA_VERSION`].
    #[must_use]
    pub const fn current(tasks: Vec<Task>) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            tasks,
        }
    }
}
