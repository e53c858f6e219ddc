//! Card State Machine
//!
//! Decides, from (state, ladder step, grade) alone, where a card goes next
//! and which memory-model formula applies. No numbers are computed here;
//! the scheduler evaluates the returned [`Transition`].
//!
//! ```text
//! New ──any──▶ Learning ──ladder done──▶ Review ──Again──▶ Relearning
//!              ▲   │ Again/Hard            ▲  │ Hard/Good/Easy   │ Again/Hard
//!              └───┘                       │  └──────┘          │
//!                                          └──ladder done───────┘
//! ```
//!
//! Nothing ever returns to New, and there is no terminal state.

use serde::{Deserialize, Serialize};

use super::grade::Grade;
use super::parameters::{Ladder, ParameterSet};
use crate::card::CardState;

/// Which stability formula a transition evaluates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StabilityUpdate {
    /// First review: S0(g), D0(g)
    Initial,
    /// Ladder review: stability held, difficulty updated
    Hold,
    /// Successful long-term review
    Recall,
    /// Lapse out of Review
    Forget,
}

/// How the next interval is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntervalRule {
    /// Fixed short step from the configured ladder
    Step { ladder: Ladder, index: usize },
    /// Long-term interval from stability and target retention
    LongTerm,
}

/// Outcome of the state machine for one review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub from: CardState,
    pub to: CardState,
    pub stability: StabilityUpdate,
    pub interval: IntervalRule,
}

impl Transition {
    /// Ladder rung the card lands on (0 when leaving the ladder)
    pub fn next_step(&self) -> u32 {
        match self.interval {
            IntervalRule::Step { index, .. } => index as u32,
            IntervalRule::LongTerm => 0,
        }
    }

    /// The review counts as a lapse
    pub fn is_lapse(&self) -> bool {
        self.stability == StabilityUpdate::Forget
    }
}

/// Successor states reachable from `state` in one review
pub fn successors(state: CardState) -> &'static [CardState] {
    match state {
        CardState::New => &[CardState::Learning],
        CardState::Learning => &[CardState::Learning, CardState::Review],
        CardState::Review => &[CardState::Review, CardState::Relearning],
        CardState::Relearning => &[CardState::Relearning, CardState::Review],
    }
}

/// Select the transition for a review
pub fn transition(state: CardState, step: u32, grade: Grade, params: &ParameterSet) -> Transition {
    match state {
        CardState::New => enter_learning(grade, params),
        CardState::Learning => climb(CardState::Learning, Ladder::Learning, step, grade, params),
        CardState::Relearning => {
            climb(CardState::Relearning, Ladder::Relearning, step, grade, params)
        }
        CardState::Review => match grade {
            Grade::Again => Transition {
                from: CardState::Review,
                to: CardState::Relearning,
                stability: StabilityUpdate::Forget,
                interval: IntervalRule::Step {
                    ladder: Ladder::Relearning,
                    index: 0,
                },
            },
            Grade::Hard | Grade::Good | Grade::Easy => Transition {
                from: CardState::Review,
                to: CardState::Review,
                stability: StabilityUpdate::Recall,
                interval: IntervalRule::LongTerm,
            },
        },
    }
}

/// New cards always land on the learning ladder; the grade picks the rung
fn enter_learning(grade: Grade, params: &ParameterSet) -> Transition {
    let last = params.ladder_len(Ladder::Learning).saturating_sub(1);
    let index = match grade {
        Grade::Again | Grade::Hard => 0,
        Grade::Good => last.min(1),
        Grade::Easy => last,
    };
    Transition {
        from: CardState::New,
        to: CardState::Learning,
        stability: StabilityUpdate::Initial,
        interval: IntervalRule::Step {
            ladder: Ladder::Learning,
            index,
        },
    }
}

/// One review while on a ladder.
///
/// Again restarts the ladder, Hard repeats the current rung, Good advances,
/// Easy graduates. A card whose rung is already past the end (the ladder was
/// shortened by a parameter reload) graduates on any passing grade.
fn climb(
    state: CardState,
    ladder: Ladder,
    step: u32,
    grade: Grade,
    params: &ParameterSet,
) -> Transition {
    let len = params.ladder_len(ladder);
    let index = step as usize;
    let exhausted = index >= len;

    let stay = |index: usize| Transition {
        from: state,
        to: state,
        stability: StabilityUpdate::Hold,
        interval: IntervalRule::Step { ladder, index },
    };
    let graduate = Transition {
        from: state,
        to: CardState::Review,
        stability: StabilityUpdate::Hold,
        interval: IntervalRule::LongTerm,
    };

    match grade {
        Grade::Again => stay(0),
        _ if exhausted => graduate,
        Grade::Hard => stay(index),
        Grade::Good if index + 1 < len => stay(index + 1),
        Grade::Good | Grade::Easy => graduate,
    }
}
