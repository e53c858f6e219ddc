//! Scheduling errors

use chrono::{DateTime, Utc};

/// Broad classification of a [`SchedulingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller can fix the input and retry
    InvalidInput,
    /// A formula produced a non-finite or out-of-domain value
    NumericFailure,
}

/// Error type for every fallible engine operation
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulingError {
    /// Grade outside Again/Hard/Good/Easy
    #[error("Invalid grade: {0}")]
    InvalidGrade(String),
    /// Review timestamp earlier than the card's last review
    #[error("Review at {reviewed_at} precedes last review at {last_review}")]
    ReviewBeforeLastReview {
        reviewed_at: DateTime<Utc>,
        last_review: DateTime<Utc>,
    },
    /// Card snapshot violates a data-model invariant
    #[error("Invalid card {card}: {reason}")]
    InvalidCard { card: String, reason: String },
    /// Parameter set failed validation
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    /// Memory model produced a non-finite or non-positive result
    #[error("Numeric failure computing {quantity}: got {value}")]
    NumericFailure { quantity: &'static str, value: f64 },
}

impl SchedulingError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulingError::NumericFailure { .. } => ErrorKind::NumericFailure,
            _ => ErrorKind::InvalidInput,
        }
    }
}

/// Scheduling result type
pub type Result<T> = std::result::Result<T, SchedulingError>;
