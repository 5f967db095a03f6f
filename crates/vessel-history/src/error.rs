//! Error types for history operations.

use thiserror::Error;

use vessel_patch::PatchError;
use vessel_types::Direction;

/// Errors that can occur while moving through the history.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistoryError {
    /// An entry could not be replayed against the current snapshot.
    #[error("history entry {index} failed to replay ({direction:?}): {source}")]
    Replay {
        index: usize,
        direction: Direction,
        #[source]
        source: PatchError,
    },
}

/// Convenience type alias for history operations.
pub type HistoryResult<T> = std::result::Result<T, HistoryError>;
