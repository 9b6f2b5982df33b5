//! Error types for the deadline tracker.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Event not found: {0}")]
    EventNotFound(Uuid),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type TrackerResult<T> = Result<T, TrackerError>;
