//! Error types for genmerge.

use thiserror::Error;

/// Result type alias for genmerge operations
pub type Result<T> = std::result::Result<T, MergeError>;

/// Errors surfaced by partition cursors and the merge engine.
///
/// A failure to open a declared partition is fatal to the whole merge;
/// there is no partition-level retry. If retry/backoff is wanted it belongs
/// in a decorator around the [`CursorResolver`](crate::source::CursorResolver),
/// not here.
#[derive(Debug, Error)]
pub enum MergeError {
    /// I/O error from an open partition
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A declared partition locator could not be opened
    #[error("Cannot open partition '{locator}': {msg}")]
    ResourceNotFound {
        /// The locator that failed to resolve
        locator: String,
        /// Underlying failure description
        msg: String,
    },

    /// A data line failed to parse as a genomic row
    #[error("Malformed row in '{locator}': {msg}")]
    MalformedRow {
        /// The partition the row came from, or empty when parsed standalone
        locator: String,
        /// What was wrong with the line
        msg: String,
    },

    /// A column projection referenced a column the row does not have
    #[error("Column index {index} out of range, row has {columns} columns")]
    ColumnOutOfRange { index: usize, columns: usize },

    /// The merge engine was constructed with no partition references
    #[error("There must be at least one source")]
    NoSources,
}

impl MergeError {
    /// Attach a partition locator to a malformed-row error that was parsed
    /// without source context.
    #[must_use]
    pub fn with_locator(self, locator: &str) -> Self {
        match self {
            MergeError::MalformedRow { msg, .. } => MergeError::MalformedRow {
                locator: locator.to_string(),
                msg,
            },
            other => other,
        }
    }
}
