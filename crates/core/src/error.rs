//! Error types for birdbook.

use birdbook_sheet::StoreError;
use thiserror::Error;

/// Result type for birdbook operations.
pub type FarmResult<T> = Result<T, FarmError>;

/// Errors that can occur in birdbook.
#[derive(Debug, Error)]
pub enum FarmError {
    /// The backing table store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// No record with this id exists.
    #[error("{kind} not found")]
    NotFound { kind: &'static str, id: String },

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A create call answered without `success: true`.
    #[error("API did not acknowledge the {0} request")]
    NotAcknowledged(String),
}

impl FarmError {
    /// Create a not-found error.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether this error means the record is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
