//! Error type shared by the repository and service layers.

use thiserror::Error;

/// Errors that can occur while serving catalogue operations
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Tables already exist")]
    AlreadyInitialized,
}
