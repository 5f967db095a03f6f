//! Diff engine for Vessel.
//!
//! Compares two value trees and produces the ordered [`Patch`] that turns
//! the old tree into the new one. The diff is pure and deterministic: the
//! same pair of trees always yields the same operations in the same order.
//!
//! # Key Functions
//!
//! - [`diff`] -- Structural diff of two trees
//! - [`loosely_equal`] -- Leaf equality rule used to decide CHANGE operations
//!
//! [`Patch`]: vessel_types::Patch

pub mod diff;
pub mod equality;

pub use diff::diff;
pub use equality::loosely_equal;
