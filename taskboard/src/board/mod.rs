//! Kanban board state.
//!
//! [`BoardView`] groups the visible tasks by column; [`BoardSync`] keeps it
//! in step with the authoritative collection and overlays an in-progress
//! drag gesture on top.

pub mod partition;
pub mod sync;

pub use partition::BoardView;
pub use sync::{BoardSync, DragOutcome, DragSession, DropTarget};
