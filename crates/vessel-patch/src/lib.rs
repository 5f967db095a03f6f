//! Patch applier for Vessel.
//!
//! Replays a [`Patch`] onto a snapshot, forward or inverted, producing a new
//! snapshot that shares every untouched subtree with the input.
//!
//! # Key Types
//!
//! - [`apply_patch`] -- Replay one patch in a [`Direction`]
//! - [`Applied`] -- The new snapshot plus the container paths the replay touched
//! - [`touched_paths`] -- Those same paths, computed from the patch alone
//! - [`PendingRemovals`] -- Mark-then-compact bookkeeping for array removals
//!
//! [`Patch`]: vessel_types::Patch
//! [`Direction`]: vessel_types::Direction

pub mod apply;
pub mod error;
pub mod removal;

pub use apply::{apply_patch, touched_paths, Applied};
pub use error::{PatchError, PatchResult};
pub use removal::{PendingRemovals, Slot};
