//! Query-parameter codec for shareable view state.
//!
//! Maps [`TaskFilters`] + [`TaskSort`] to a flat string-keyed parameter set
//! and back. Default values are omitted on encode, so the default view
//! always produces an empty query string.
//!
//! Parameter names: `status` (comma-joined status tokens), `priority`,
//! `search`, `sortField`, `sortDirection`.
//!
//! Decoding is lenient: unknown status tokens are dropped one by one, an
//! unknown priority means no constraint, an unknown direction means
//! `desc`. An unrecognized `sortField` decodes to `updatedAt`, while an
//! absent one decodes to `createdAt`; this mirrors how shared links have
//! always behaved and is kept as-is.

use std::collections::BTreeSet;

use url::form_urlencoded;

use crate::filters::{SortDirection, SortField, TaskFilters, TaskSort};
use crate::task::{TaskPriority, TaskStatus};

/// Parameter carrying the comma-joined status set.
pub const PARAM_STATUS: &str = "status";
/// Parameter carrying the priority token.
pub const PARAM_PRIORITY: &str = "priority";
/// Parameter carrying the search text.
pub const PARAM_SEARCH: &str = "search";
/// Parameter carrying the sort field token.
pub const PARAM_SORT_FIELD: &str = "sortField";
/// Parameter carrying the sort direction token.
pub const PARAM_SORT_DIRECTION: &str = "sortDirection";

/// Sort field used when `sortField` is present but unrecognized.
pub const FALLBACK_SORT_FIELD: SortField = SortField::UpdatedAt;

/// Flat string-keyed parameter set, in insertion order.
///
/// Setting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Parses a `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored. Repeated keys keep the last value.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.set(key.into_owned(), value.into_owned());
        }
        params
    }

    /// Serializes the parameters as a query string (without leading `?`).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// Returns the value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Inserts or replaces `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.pairs.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.pairs.push((key, value));
        }
    }

    /// Returns `true` if no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Non-empty value for `key`; empty values count as absent.
    fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }
}

/// Decoded view state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Which tasks are shown.
    pub filters: TaskFilters,
    /// How they are ordered.
    pub sort: TaskSort,
}

/// Decodes view state, falling back to defaults for anything invalid.
#[must_use]
pub fn decode(params: &QueryParams) -> ViewState {
    let statuses: BTreeSet<TaskStatus> = params
        .non_empty(PARAM_STATUS)
        .map(|raw| {
            raw.split(',')
                .filter_map(|token| token.parse::<TaskStatus>().ok())
                .collect()
        })
        .unwrap_or_default();

    let priority = params
        .non_empty(PARAM_PRIORITY)
        .and_then(|raw| raw.parse::<TaskPriority>().ok());

    let search = params.get(PARAM_SEARCH).unwrap_or_default().to_string();

    let field = params
        .non_empty(PARAM_SORT_FIELD)
        .map_or(SortField::CreatedAt, |raw| {
            raw.parse::<SortField>().unwrap_or(FALLBACK_SORT_FIELD)
        });

    let direction = params
        .non_empty(PARAM_SORT_DIRECTION)
        .and_then(SortDirection::parse)
        .unwrap_or(SortDirection::Desc);

    ViewState {
        filters: TaskFilters {
            statuses,
            priority,
            search,
        },
        sort: TaskSort::new(field, direction),
    }
}

/// Encodes view state, omitting every key that holds its default.
///
/// When the sort differs from the default, both sort keys are written.
#[must_use]
pub fn encode(filters: &TaskFilters, sort: &TaskSort) -> QueryParams {
    let mut params = QueryParams::new();

    if !filters.statuses.is_empty() {
        let joined = filters
            .statuses
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(",");
        params.set(PARAM_STATUS, joined);
    }

    if let Some(priority) = filters.priority {
        params.set(PARAM_PRIORITY, priority.as_str());
    }

    if !filters.search.is_empty() {
        params.set(PARAM_SEARCH, filters.search.clone());
    }

    if *sort != TaskSort::default() {
        params.set(PARAM_SORT_FIELD, sort.field.as_str());
        params.set(PARAM_SORT_DIRECTION, sort.direction.as_str());
    }

    params
}
