//! Error types for the to-do list core.

use thiserror::Error;

/// Errors returned by task list operations
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TaskListError {
    /// An index outside `0..len` of the pending list
    #[error("{op}: index {index} out of range for {len} pending task(s)")]
    InvalidIndex { op: &'static str, index: usize, len: usize },
}

/// Result type alias for task list operations
pub type Result<T> = std::result::Result<T, TaskListError>;
