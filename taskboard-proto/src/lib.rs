//! Shared task model and wire formats for `TaskBoard`.

pub mod filters;
pub mod params;
pub mod storage;
pub mod task;
