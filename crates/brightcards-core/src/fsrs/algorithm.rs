//! Memory Model
//!
//! Pure FSRS formulas mapping (stability, difficulty, retrievability, grade)
//! to the next stability and difficulty. Nothing here reads a clock or
//! touches a card; callers supply elapsed time explicitly.
//!
//! Any formula that would yield a non-finite (or, for stability, non-positive)
//! value returns [`SchedulingError::NumericFailure`] instead of a clamped
//! fallback.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::{Result, SchedulingError};
use super::grade::Grade;
use super::parameters::Weights;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Forgetting-curve exponent C in R = (1 + F·t/S)^C
pub const DECAY: f64 = -0.5;

/// Forgetting-curve factor F, chosen so that R(S, S) = 0.9
pub const FACTOR: f64 = 19.0 / 81.0;

/// Lower difficulty bound
pub const MIN_DIFFICULTY: f64 = 1.0;

/// Upper difficulty bound
pub const MAX_DIFFICULTY: f64 = 10.0;

/// Floor for first-review stability
pub const MIN_INITIAL_STABILITY: f64 = 0.1;

/// Intervals shorter than this (days) are never fuzzed
pub const FUZZ_MIN_INTERVAL: f64 = 2.5;

// ============================================================================
// HELPERS
// ============================================================================

fn finite(quantity: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SchedulingError::NumericFailure { quantity, value })
    }
}

fn finite_positive(quantity: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SchedulingError::NumericFailure { quantity, value })
    }
}

fn clamp_difficulty(d: f64) -> f64 {
    d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

// ============================================================================
// INITIAL STATE
// ============================================================================

/// D0(g) = w4 − e^(w5·(g−1)) + 1, before clamping
fn raw_initial_difficulty(w: &Weights, grade: Grade) -> f64 {
    w[4] - (w[5] * (grade.as_f64() - 1.0)).exp() + 1.0
}

/// Difficulty assigned on the very first review, clamped to [1, 10]
pub fn initial_difficulty(w: &Weights, grade: Grade) -> f64 {
    clamp_difficulty(raw_initial_difficulty(w, grade))
}

/// Stability assigned on the very first review: one base weight per grade
pub fn initial_stability(w: &Weights, grade: Grade) -> f64 {
    w[grade.index()].max(MIN_INITIAL_STABILITY)
}

// ============================================================================
// DIFFICULTY
// ============================================================================

/// Difficulty after a subsequent review.
///
/// Linear damping shrinks the step as D approaches 10, then mean reversion
/// pulls the result toward D0(Easy).
pub fn next_difficulty(w: &Weights, difficulty: f64, grade: Grade) -> Result<f64> {
    let delta = -w[6] * (grade.as_f64() - 3.0);
    let damped = difficulty + delta * (MAX_DIFFICULTY - difficulty) / 9.0;
    let target = initial_difficulty(w, Grade::Easy);
    let reverted = w[7] * target + (1.0 - w[7]) * damped;
    finite("difficulty", reverted).map(clamp_difficulty)
}

// ============================================================================
// RETRIEVABILITY & INTERVAL
// ============================================================================

/// Probability of recall after `elapsed_days` for a card with `stability`.
///
/// Negative elapsed time is treated as zero. Returns 0 for non-positive stability.
pub fn retrievability(elapsed_days: f64, stability: f64) -> f64 {
    if stability <= 0.0 {
        return 0.0;
    }
    let t = elapsed_days.max(0.0);
    (1.0 + FACTOR * t / stability).powf(DECAY)
}

/// Days until retrievability falls to `target_retention`.
///
/// Inverse of [`retrievability`]: t = S/F · (r^(1/C) − 1).
pub fn next_interval(stability: f64, target_retention: f64) -> f64 {
    stability / FACTOR * (target_retention.powf(1.0 / DECAY) - 1.0)
}

/// Spread an interval uniformly within ±`fuzz_factor` (at least ±1 day).
///
/// Deterministic for a given seed so a replayed review lands on the same day.
/// Intervals under [`FUZZ_MIN_INTERVAL`] are returned unchanged.
pub fn fuzz_interval(interval: f64, fuzz_factor: f64, seed: u64) -> f64 {
    if !interval.is_finite() || interval < FUZZ_MIN_INTERVAL {
        return interval;
    }
    let delta = (interval * fuzz_factor).max(1.0);
    let mut rng = StdRng::seed_from_u64(seed);
    rng.gen_range((interval - delta)..=(interval + delta))
}

// ============================================================================
// STABILITY
// ============================================================================

/// Stability after a successful recall (Hard, Good, Easy).
///
/// S' = S · (1 + e^w8 · (11 − D) · S^−w9 · (e^(w10·(1 − R)) − 1) · bonus)
pub fn next_recall_stability(
    w: &Weights,
    stability: f64,
    difficulty: f64,
    retrievability: f64,
    grade: Grade,
) -> Result<f64> {
    let bonus = match grade {
        Grade::Hard => w[15],
        Grade::Easy => w[16],
        Grade::Good => 1.0,
        Grade::Again => {
            return Err(SchedulingError::InvalidGrade(
                "again is not a recall grade".to_string(),
            ));
        }
    };

    let growth = w[8].exp()
        * (11.0 - difficulty)
        * stability.powf(-w[9])
        * ((w[10] * (1.0 - retrievability)).exp() - 1.0)
        * bonus;

    finite_positive("recall stability", stability * (1.0 + growth))
}

/// Stability after a lapse (Again).
///
/// S' = w11 · D^−w12 · ((S + 1)^w13 − 1) · e^(w14·(1 − R)), never above S.
pub fn next_forget_stability(
    w: &Weights,
    stability: f64,
    difficulty: f64,
    retrievability: f64,
) -> Result<f64> {
    let relearned = w[11]
        * difficulty.powf(-w[12])
        * ((stability + 1.0).powf(w[13]) - 1.0)
        * (w[14] * (1.0 - retrievability)).exp();

    let relearned = finite_positive("forget stability", relearned)?;
    Ok(relearned.min(stability))
}
