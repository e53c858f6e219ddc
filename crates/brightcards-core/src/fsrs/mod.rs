//! FSRS (Free Spaced Repetition Scheduler) Module
//!
//! Memory model, card state machine, and per-review scheduler.
//!
//! Reference: https://github.com/open-spaced-repetition/fsrs4anki
//!
//! ## Core Formulas:
//! - Retrievability: R = (1 + F·t/S)^C with C = -0.5, F = 19/81
//! - Interval: t = S/F · (r^(1/C) - 1)
//! - Difficulty: linear damping toward 10, mean reversion toward D0(Easy)
//!
//! Everything here is pure and synchronous. Time comes in as arguments and
//! nothing is logged or persisted.

mod algorithm;
mod error;
mod grade;
mod parameters;
mod scheduler;
mod transition;

pub use algorithm::{
    fuzz_interval,
    initial_difficulty,
    initial_stability,
    next_difficulty,
    next_forget_stability,
    next_interval,
    next_recall_stability,
    // Core functions
    retrievability,
    // Constants
    DECAY,
    FACTOR,
    FUZZ_MIN_INTERVAL,
    MAX_DIFFICULTY,
    MIN_DIFFICULTY,
    MIN_INITIAL_STABILITY,
};

pub use error::{ErrorKind, Result, SchedulingError};
pub use grade::Grade;
pub use parameters::{
    Ladder, ParameterSet, Weights, DEFAULT_FUZZ_FACTOR, DEFAULT_MAX_INTERVAL,
    DEFAULT_MIN_INTERVAL, DEFAULT_RETENTION, DEFAULT_WEIGHTS, WEIGHT_COUNT,
};
pub use scheduler::{PreviewResults, ReviewOutcome, Scheduler};
pub use transition::{successors, transition, IntervalRule, StabilityUpdate, Transition};
