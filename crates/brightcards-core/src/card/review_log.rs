//! Review log - append-only audit record, one per review

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{CardId, CardState};
use crate::fsrs::Grade;

/// One review event with the model state on either side of it.
///
/// Carries enough to re-fit the weights later: grade, elapsed time, and the
/// stability/difficulty/retrievability the model used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLog {
    pub card_id: CardId,
    pub grade: Grade,
    pub reviewed_at: DateTime<Utc>,
    /// Days since the previous review (0 for a first review)
    pub elapsed_days: f64,
    pub state_before: CardState,
    pub state_after: CardState,
    pub stability_before: Option<f64>,
    pub stability_after: f64,
    pub difficulty_before: Option<f64>,
    pub difficulty_after: f64,
    /// Recall probability at review time, when a prior stability existed
    pub retrievability: Option<f64>,
    /// Resulting interval in days
    pub scheduled_days: f64,
}

impl ReviewLog {
    /// The review counted as a lapse out of Review
    pub fn is_lapse(&self) -> bool {
        self.state_before == CardState::Review && self.state_after == CardState::Relearning
    }
}
