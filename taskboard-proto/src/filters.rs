//! Filter and sort criteria for the task views.
//!
//! These are transient: they live in the query string, never in the stored
//! document.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::task::{TaskPriority, TaskStatus};

/// Which tasks a view shows.
///
/// All three predicates are conjunctive; an empty/unset predicate places
/// no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilters {
    /// Allowed statuses; empty means any.
    pub statuses: BTreeSet<TaskStatus>,
    /// Required priority, if any.
    pub priority: Option<TaskPriority>,
    /// Case-insensitive substring of title or description; empty means any.
    pub search: String,
}

impl TaskFilters {
    /// Returns `true` if no predicate is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty() && self.priority.is_none() && self.search.is_empty()
    }
}

/// Error returned when a sort field token is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort field: {0:?}")]
pub struct ParseSortFieldError(pub String);

/// Field a view is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    /// Creation instant.
    CreatedAt,
    /// Last-mutation instant.
    UpdatedAt,
    /// Priority, `High > Medium > Low`.
    Priority,
}

impl SortField {
    /// All sort fields.
    pub const ALL: [Self; 3] = [Self::CreatedAt, Self::UpdatedAt, Self::Priority];

    /// Returns the query-string token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
            Self::Priority => "priority",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = ParseSortFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ParseSortFieldError(s.to_string()))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// Returns the query-string token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Parses a direction token; anything unrecognized yields `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskSort {
    /// Field to compare.
    pub field: SortField,
    /// Direction of the comparison.
    pub direction: SortDirection,
}

impl TaskSort {
    /// Creates a sort specification.
    #[must_use]
    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

impl Default for TaskSort {
    /// Newest first.
    fn default() -> Self {
        Self::new(SortField::CreatedAt, SortDirection::Desc)
    }
}
