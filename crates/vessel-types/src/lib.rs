//! Foundation types for Vessel, a versioned in-memory state container.
//!
//! This crate defines the plain value tree that every snapshot is made of,
//! plus the path and operation vocabulary shared by the diff engine, the
//! patch applier, and the history manager.
//!
//! # Key Types
//!
//! - [`Value`] -- Plain tree node; containers sit behind `Arc` for structural sharing
//! - [`Rich`] -- Closed set of leaf kinds compared loosely (date, regex, boxed string/number)
//! - [`Path`] / [`Seg`] -- Location of a node from the tree root
//! - [`Operation`] -- Single CREATE/CHANGE/REMOVE edit carrying what it needs to invert
//! - [`Patch`] -- Ordered operations forming one atomic transition
//! - [`Direction`] -- Whether a patch is replayed forward or inverted

pub mod error;
pub mod op;
pub mod path;
pub mod rich;
pub mod value;

pub use error::{TypeError, TypeResult};
pub use op::{Direction, Effect, OpKind, Operation, Patch};
pub use path::{Path, Seg};
pub use rich::Rich;
pub use value::{Map, Value};
