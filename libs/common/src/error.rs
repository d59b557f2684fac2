//! Shared error types for database infrastructure

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred while connecting to the database
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred while executing a query
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred while applying migrations
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
