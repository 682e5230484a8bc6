//! Store errors

use thiserror::Error;

/// Store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    /// Record not found
    #[error("record not found")]
    NotFound,

    /// A record with the same subject already exists
    #[error("subject already exists: {0}")]
    Conflict(String),

    /// The backing store could not be reached or failed mid-operation
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations
pub type DbResult<T> = Result<T, DbError>;
