//! Vessel: a versioned in-memory state container.
//!
//! A [`Store`] holds one immutable snapshot of a plain value tree. Edits are
//! made against a draft, diffed into a patch, and replayed copy-on-write so
//! the next snapshot shares every untouched subtree with the previous one.
//! Patches go onto an undo/redo history; pausing coalesces many edits (a
//! drag gesture, say) into one undoable step. Subscribers hear about every
//! change, either globally or for a single dotted path.
//!
//! # Key Types
//!
//! - [`Store`] -- The container: mutate, update, pause, resume, undo, redo
//! - [`StoreConfig`] / [`DraftStrategy`] -- How drafts are made, how much history is kept
//! - [`SubscriptionBus`] / [`SubscriptionId`] -- Listener registry and fan-out
//! - [`Notification`] / [`EventKind`] -- What a listener receives
//!
//! # Example
//!
//! ```
//! use vessel_store::{Store, Value};
//!
//! let mut store = Store::new(Value::from(serde_json::json!({"fruits": ["apple"]})));
//! store.mutate(|s| s["fruits"].push("pear").unwrap()).unwrap();
//! assert_eq!(store.state()["fruits"].len(), 2);
//!
//! store.undo().unwrap();
//! assert_eq!(store.state()["fruits"].len(), 1);
//! ```

pub mod bus;
pub mod config;
pub mod draft;
pub mod error;
pub mod event;
pub mod store;

pub use bus::{Listener, SubscriptionBus, SubscriptionId};
pub use config::StoreConfig;
pub use draft::DraftStrategy;
pub use error::{StoreError, StoreResult};
pub use event::{EventKind, Notification};
pub use store::{Processor, Store};

pub use vessel_types::{Patch, Path, Rich, Value};
