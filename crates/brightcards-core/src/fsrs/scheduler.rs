//! Scheduler
//!
//! Runs one review end to end: validate the snapshot, pick the transition,
//! evaluate the memory model, choose an interval, and produce the updated
//! card together with its review log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm::{
    fuzz_interval, initial_difficulty, initial_stability, next_difficulty, next_forget_stability,
    next_interval, next_recall_stability, retrievability,
};
use super::error::{Result, SchedulingError};
use super::grade::Grade;
use super::parameters::{days_to_duration, ParameterSet};
use super::transition::{transition, IntervalRule, StabilityUpdate, Transition};
use crate::card::{Card, ReviewLog};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Updated card plus the log entry describing the review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub card: Card,
    pub log: ReviewLog,
}

/// What each grade would do to a card, without committing anything
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResults {
    pub again: ReviewOutcome,
    pub hard: ReviewOutcome,
    pub good: ReviewOutcome,
    pub easy: ReviewOutcome,
}

impl PreviewResults {
    pub fn get(&self, grade: Grade) -> &ReviewOutcome {
        match grade {
            Grade::Again => &self.again,
            Grade::Hard => &self.hard,
            Grade::Good => &self.good,
            Grade::Easy => &self.easy,
        }
    }

    /// Outcomes paired with their grade, worst to best
    pub fn iter(&self) -> impl Iterator<Item = (Grade, &ReviewOutcome)> {
        Grade::ALL.into_iter().map(move |g| (g, self.get(g)))
    }
}

/// FSRS scheduler bound to one validated parameter set.
///
/// Immutable and `Send + Sync`; share it freely. [`Scheduler::reload`]
/// returns a new scheduler rather than mutating this one.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheduler {
    params: ParameterSet,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            params: ParameterSet::default(),
        }
    }
}

impl Scheduler {
    /// Create a scheduler, rejecting invalid parameters
    pub fn new(params: ParameterSet) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Scheduler with replacement parameters.
    ///
    /// Only future reviews see the new weights; stored stability and
    /// difficulty are left as they are.
    pub fn reload(&self, params: ParameterSet) -> Result<Self> {
        Self::new(params)
    }

    /// Apply `grade` to `card` as of `reviewed_at`
    pub fn submit_review(
        &self,
        card: &Card,
        grade: Grade,
        reviewed_at: DateTime<Utc>,
    ) -> Result<ReviewOutcome> {
        card.validate()?;

        let elapsed_days = match card.last_review {
            Some(last) if reviewed_at < last => {
                return Err(SchedulingError::ReviewBeforeLastReview {
                    reviewed_at,
                    last_review: last,
                });
            }
            Some(last) => (reviewed_at - last).num_milliseconds() as f64 / MS_PER_DAY,
            None => 0.0,
        };

        let recall = card.stability.map(|s| retrievability(elapsed_days, s));
        let step = transition(card.state, card.step, grade, &self.params);
        let (stability, difficulty) =
            self.evaluate(card, &step, grade, elapsed_days, recall.unwrap_or(1.0))?;

        let reps = card.reps.saturating_add(1);
        let interval = match step.interval {
            IntervalRule::Step { ladder, index } => self.params.step_days(ladder, index),
            IntervalRule::LongTerm => self.long_term_interval(stability, card, reps)?,
        };

        let due = reviewed_at
            .checked_add_signed(days_to_duration(interval))
            .filter(|due| *due > reviewed_at)
            .ok_or(SchedulingError::NumericFailure {
                quantity: "due date",
                value: interval,
            })?;

        let updated = Card {
            state: step.to,
            stability: Some(stability),
            difficulty: Some(difficulty),
            due,
            last_review: Some(reviewed_at),
            reps,
            lapses: if step.is_lapse() {
                card.lapses.saturating_add(1)
            } else {
                card.lapses
            },
            scheduled_days: interval,
            step: step.next_step(),
            ..card.clone()
        };

        let log = ReviewLog {
            card_id: card.id,
            grade,
            reviewed_at,
            elapsed_days,
            state_before: card.state,
            state_after: step.to,
            stability_before: card.stability,
            stability_after: stability,
            difficulty_before: card.difficulty,
            difficulty_after: difficulty,
            retrievability: recall,
            scheduled_days: interval,
        };

        Ok(ReviewOutcome { card: updated, log })
    }

    /// Outcome of every grade at `at`, for grade-button hints
    pub fn preview(&self, card: &Card, at: DateTime<Utc>) -> Result<PreviewResults> {
        Ok(PreviewResults {
            again: self.submit_review(card, Grade::Again, at)?,
            hard: self.submit_review(card, Grade::Hard, at)?,
            good: self.submit_review(card, Grade::Good, at)?,
            easy: self.submit_review(card, Grade::Easy, at)?,
        })
    }

    /// Current probability of recall; `None` for cards never reviewed
    pub fn retrievability_at(&self, card: &Card, at: DateTime<Utc>) -> Option<f64> {
        let stability = card.stability?;
        let last = card.last_review?;
        let elapsed = (at - last).num_milliseconds() as f64 / MS_PER_DAY;
        Some(retrievability(elapsed, stability))
    }

    /// New (stability, difficulty) for the chosen transition
    fn evaluate(
        &self,
        card: &Card,
        step: &Transition,
        grade: Grade,
        elapsed_days: f64,
        recall: f64,
    ) -> Result<(f64, f64)> {
        let w = &self.params.weights;

        if step.stability == StabilityUpdate::Initial {
            return Ok((initial_stability(w, grade), initial_difficulty(w, grade)));
        }

        let (s, d) = match (card.stability, card.difficulty) {
            (Some(s), Some(d)) => (s, d),
            _ => {
                return Err(SchedulingError::InvalidCard {
                    card: card.id.to_string(),
                    reason: format!("{} card has no memory state", card.state),
                });
            }
        };

        // Long-term updates need time to have passed since the last review
        let stability = match step.stability {
            StabilityUpdate::Hold | StabilityUpdate::Initial => s,
            StabilityUpdate::Recall | StabilityUpdate::Forget if elapsed_days <= 0.0 => s,
            StabilityUpdate::Recall => next_recall_stability(w, s, d, recall, grade)?,
            StabilityUpdate::Forget => next_forget_stability(w, s, d, recall)?,
        };
        let difficulty = next_difficulty(w, d, grade)?;

        Ok((stability, difficulty))
    }

    /// Whole-day interval from stability: fuzz, round, then clamp
    fn long_term_interval(&self, stability: f64, card: &Card, reps: u32) -> Result<f64> {
        let p = &self.params;
        let raw = next_interval(stability, p.target_retention);
        if !raw.is_finite() {
            return Err(SchedulingError::NumericFailure {
                quantity: "interval",
                value: raw,
            });
        }

        let fuzzed = if p.enable_fuzz {
            fuzz_interval(raw, p.fuzz_factor, fuzz_seed(card, reps))
        } else {
            raw
        };

        Ok(fuzzed.round().clamp(p.min_interval, p.max_interval))
    }
}

/// Same card and rep count always fuzz to the same day
fn fuzz_seed(card: &Card, reps: u32) -> u64 {
    card.id.seed() ^ u64::from(reps).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
