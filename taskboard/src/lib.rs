//! `TaskBoard` — kanban task board core.
//!
//! Owns the persisted task collection ([`tasks::TaskManager`] over
//! [`storage::TaskStorage`]), derives filtered and sorted views from it, and
//! keeps a drag-aware board ([`board::BoardSync`]) in step with both.

pub mod app;
pub mod board;
pub mod clock;
pub mod config;
pub mod storage;
pub mod tasks;
