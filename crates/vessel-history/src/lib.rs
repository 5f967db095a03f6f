//! Undo/redo history for Vessel.
//!
//! Stores committed patches on a linear timeline with a cursor, and
//! coalesces the patches recorded while paused into a single entry.
//!
//! # Key Types
//!
//! - [`History`] -- Timeline, cursor, pause flag, and pending batch
//! - [`HistoryEntry`] -- One undoable step (one patch, or a resumed batch)
//! - [`Recorded`] -- Outcome of recording a patch
//! - [`Step`] -- A replayed undo or redo

pub mod entry;
pub mod error;
pub mod history;

pub use entry::HistoryEntry;
pub use error::{HistoryError, HistoryResult};
pub use history::{History, Recorded, Step};
