//! Error types for store operations.

use thiserror::Error;

use vessel_history::HistoryError;
use vessel_patch::PatchError;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The edit function passed to `try_mutate`/`try_update` failed.
    /// Nothing was committed.
    #[error("mutator failed: {0}")]
    Mutator(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An undo or redo could not be replayed.
    #[error(transparent)]
    History(#[from] HistoryError),

    /// A freshly computed patch could not be applied.
    #[error(transparent)]
    Patch(#[from] PatchError),

    /// The store configuration could not be parsed.
    #[error("invalid store config: {0}")]
    Config(String),
}

/// Convenience type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
