//! Error types for famcal-conflict

use thiserror::Error;

/// famcal-conflict error type
#[derive(Error, Debug)]
pub enum ConflictError {
    /// The scoping event does not exist
    #[error("Event not found: {0}")]
    NotFound(String),

    /// The backing event store could not be read
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Scan cancelled")]
    Cancelled,

    /// A single notification could not be written. Collected per item,
    /// never returned from a scan.
    #[error("Notification write error: {0}")]
    NotificationWrite(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ConflictError>;
