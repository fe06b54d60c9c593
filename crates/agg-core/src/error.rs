use agg_events::queue::EnqueueError;
use thiserror::Error;

/// Failure of the dedup store itself. A key that is already present is not an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("dedup store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("malformed request body: {message}")]
    Malformed { message: String },
    #[error("invalid event at index {index}: {message}")]
    Invalid { index: usize, message: String },
    #[error(transparent)]
    Enqueue(#[from] EnqueueError),
}

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error("internal error: {message}")]
    Internal { message: String },
}
