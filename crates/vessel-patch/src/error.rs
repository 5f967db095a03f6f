//! Error types for the patch crate.

use vessel_types::Path;

/// Errors that can occur while replaying a patch.
///
/// A patch produced by the diff engine never fails against the snapshot it
/// was computed from; these errors indicate a patch replayed onto the wrong
/// tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatchError {
    /// A path step did not resolve.
    #[error("path not found: '{path}'")]
    PathNotFound { path: Path },

    /// A path step landed on a node that cannot hold the next segment.
    #[error("node at '{path}' is a {found}, not a matching container")]
    NotAContainer { path: Path, found: &'static str },

    /// An array write skipped past the end of the array.
    #[error("index {index} out of bounds for array at '{path}' of length {len}")]
    IndexOutOfBounds { path: Path, index: usize, len: usize },

    /// The root cannot be deleted, only replaced.
    #[error("cannot delete the root node")]
    RootDelete,
}

/// Convenience alias for patch results.
pub type PatchResult<T> = Result<T, PatchError>;
