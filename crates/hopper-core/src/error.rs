use thiserror::Error;

use crate::item::ItemStatus;

/// Failures surfaced by queue operations.
///
/// A corrupt items document is not represented here: `ItemStore::load`
/// absorbs it and starts from an empty queue.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("No item found matching \"{0}\"")]
    NotFound(String),
    #[error("No in-progress item found with token \"{0}\"")]
    TokenNotFound(String),
    #[error("Ambiguous id prefix \"{prefix}\" matches {count} items; use a longer prefix")]
    AmbiguousPrefix { prefix: String, count: usize },
    #[error("Cannot {action} item {id}: status is \"{status}\"")]
    InvalidState {
        action: &'static str,
        id: String,
        status: ItemStatus,
    },
    #[error("{0}")]
    Validation(String),
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize items: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QueueError>;
