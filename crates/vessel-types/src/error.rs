use thiserror::Error;

/// Errors produced by value tree operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("expected an array, found {found}")]
    NotAnArray { found: &'static str },

    #[error("expected an object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Result alias for value tree operations.
pub type TypeResult<T> = Result<T, TypeError>;
