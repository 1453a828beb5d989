//! Schema migration chain for the stored document.
//!
//! Migrations operate on the raw JSON value so that records written by
//! older layouts (missing fields, empty strings) can be repaired before the
//! strict [`StorageDocument`] decode runs. Each step is a pure function from
//! one version to the next; [`migrate`] applies steps until the document
//! reaches [`CURRENT_SCHEMA_VERSION`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use taskboard_proto::storage::{CURRENT_SCHEMA_VERSION, LEGACY_SCHEMA_VERSION, StorageDocument};

/// Field holding the document's layout version.
const SCHEMA_VERSION_FIELD: &str = "schemaVersion";

/// Errors raised while migrating a raw document.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MigrationError {
    /// The value is not a document object, or its version is not an integer.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// No registered step starts at this version.
    #[error("no migration step from schema version {0}")]
    NoPath(u32),

    /// A migrated document still fails strict decoding.
    #[error("migrated document violates task invariants: {0}")]
    Invariant(String),
}

/// One forward step of the chain.
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep {
    /// Version this step reads.
    pub from: u32,
    /// Version this step writes.
    pub to: u32,
    /// Pure transformation of the raw document.
    pub apply: fn(Value, DateTime<Utc>) -> Value,
}

/// Every registered step, ordered by `from`.
pub const STEPS: &[MigrationStep] = &[MigrationStep {
    from: 1,
    to: 2,
    apply: backfill_timestamps,
}];

/// Result of running the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migrated {
    /// Strictly decoded document at the current (or a newer) version.
    pub document: StorageDocument,
    /// `true` if at least one step ran.
    pub migrated: bool,
}

/// Reads the document's version. A missing, null or zero version means the
/// legacy layout.
///
/// # Errors
///
/// Returns [`MigrationError::InvalidDocument`] if `doc` is not an object or
/// the version is not a non-negative integer.
pub fn schema_version(doc: &Value) -> Result<u32, MigrationError> {
    let obj = doc
        .as_object()
        .ok_or_else(|| MigrationError::InvalidDocument("expected a JSON object".to_string()))?;
    match obj.get(SCHEMA_VERSION_FIELD) {
        None | Some(Value::Null) => Ok(LEGACY_SCHEMA_VERSION),
        Some(v) => match v.as_u64().map(u32::try_from) {
            Some(Ok(0)) => Ok(LEGACY_SCHEMA_VERSION),
            Some(Ok(version)) => Ok(version),
            _ => Err(MigrationError::InvalidDocument(format!("bad schemaVersion: {v}"))),
        },
    }
}

/// Runs the chain from the document's version up to the current one, then
/// decodes strictly.
///
/// A document already at (or beyond) the current version passes through
/// untouched and reports `migrated = false`.
///
/// # Errors
///
/// Returns [`MigrationError::InvalidDocument`] or [`MigrationError::NoPath`]
/// if the chain cannot run, and [`MigrationError::Invariant`] if the result
/// still fails strict decoding.
pub fn migrate(doc: Value, now: DateTime<Utc>) -> Result<Migrated, MigrationError> {
    migrate_with(STEPS, doc, now)
}

/// [`migrate`] over an explicit step list.
///
/// # Errors
///
/// See [`migrate`].
pub fn migrate_with(
    steps: &[MigrationStep],
    mut doc: Value,
    now: DateTime<Utc>,
) -> Result<Migrated, MigrationError> {
    let mut version = schema_version(&doc)?;
    let mut migrated = false;

    while version < CURRENT_SCHEMA_VERSION {
        let step = steps
            .iter()
            .find(|s| s.from == version)
            .ok_or(MigrationError::NoPath(version))?;
        doc = (step.apply)(doc, now);
        set_version(&mut doc, step.to);
        tracing::debug!(from = step.from, to = step.to, "applied schema migration step");
        version = step.to;
        migrated = true;
    }

    let document: StorageDocument =
        serde_json::from_value(doc).map_err(|e| MigrationError::Invariant(e.to_string()))?;

    Ok(Migrated { document, migrated })
}

fn set_version(doc: &mut Value, version: u32) {
    if let Some(obj) = doc.as_object_mut() {
        obj.insert(SCHEMA_VERSION_FIELD.to_string(), Value::from(version));
    }
}

/// v1 → v2: every task gets `createdAt`/`updatedAt`; missing, null or empty
/// values are filled with `now`.
fn backfill_timestamps(mut doc: Value, now: DateTime<Utc>) -> Value {
    let stamp = Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true));
    if let Some(tasks) = doc.get_mut("tasks").and_then(Value::as_array_mut) {
        for task in tasks.iter_mut().filter_map(Value::as_object_mut) {
            fill_if_blank(task, "createdAt", &stamp);
            fill_if_blank(task, "updatedAt", &stamp);
        }
    }
    doc
}

fn fill_if_blank(task: &mut Map<String, Value>, field: &str, stamp: &Value) {
    let blank = match task.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };
    if blank {
        task.insert(field.to_string(), stamp.clone());
    }
}
