use pipeline::{TrackerError, ValidationError};
use thiserror::Error;

/// Why a run stopped before finishing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PublishError {
    /// The rows are unfit for publishing; nothing was created.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The tracker failed while indexing or creating issues.
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}
