use crate::workflow::ResourceId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeletionError {
    #[error("Invalid interval '{0}': {1}")]
    InvalidInterval(String, String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("No deletion record for resource {0}")]
    RecordNotFound(ResourceId),

    #[error("Resource {0} could not be moved to the staging area")]
    StagingMoveFailed(ResourceId),

    /// Raised by [`RecordStore`](crate::interface::RecordStore) implementations.
    #[error("Record store error: {0}")]
    Store(String),

    #[error("Resource lifecycle error: {0}")]
    Resource(String),

    /// Raised by [`Notifier`](crate::interface::Notifier) implementations.
    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Sweep worker error: {0}")]
    Worker(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeletionError>;
