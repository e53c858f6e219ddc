//! Parameter Set
//!
//! The 17 memory-model weights plus the scheduling configuration around them:
//! target retention, interval bounds, fuzz, and the short-step ladders used
//! while a card is learning or relearning.
//!
//! A parameter set is loaded once (usually from a JSON file), validated, and
//! then handed to the [`Scheduler`](super::Scheduler). Replacing it only
//! affects future reviews; stored stability and difficulty are never
//! recomputed.

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::error::{Result, SchedulingError};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Number of memory-model weights
pub const WEIGHT_COUNT: usize = 17;

/// Memory-model weights
pub type Weights = [f64; WEIGHT_COUNT];

/// Default weights (FSRS-5 defaults, first 17 slots)
///
/// Slots:
/// - w[0..4]: initial stability for Again, Hard, Good, Easy
/// - w[4], w[5]: initial difficulty
/// - w[6]: difficulty delta per grade
/// - w[7]: difficulty mean reversion
/// - w[8], w[9], w[10]: stability growth on recall
/// - w[11..15]: stability after a lapse
/// - w[15]: Hard penalty
/// - w[16]: Easy bonus
pub const DEFAULT_WEIGHTS: Weights = [
    0.40255, 1.18385, 3.173, 15.69105, // initial stability
    7.1949, 0.5345, // initial difficulty
    1.4604, // difficulty delta
    0.0046, // mean reversion
    1.54575, 0.1192, 1.01925, // recall stability
    1.9395, 0.11, 0.29605, 2.2698, // forget stability
    0.2315, // hard penalty
    2.9898, // easy bonus
];

/// Accepted range for each weight (inclusive)
const WEIGHT_RANGES: [(f64, f64); WEIGHT_COUNT] = [
    (0.001, 100.0),
    (0.001, 100.0),
    (0.001, 100.0),
    (0.001, 100.0),
    (1.0, 10.0),
    (0.001, 4.0),
    (0.001, 4.0),
    (0.001, 0.75),
    (0.0, 4.5),
    (0.0, 0.8),
    (0.001, 3.5),
    (0.001, 5.0),
    (0.001, 0.25),
    (0.001, 0.9),
    (0.0, 4.0),
    (0.0, 1.0),
    (1.0, 6.0),
];

/// Default target retention (probability of recall at the due date)
pub const DEFAULT_RETENTION: f64 = 0.9;

/// Default minimum long-term interval in days
pub const DEFAULT_MIN_INTERVAL: f64 = 1.0;

/// Default maximum long-term interval in days (100 years)
pub const DEFAULT_MAX_INTERVAL: f64 = 36500.0;

/// Upper bound accepted for `max_interval`
const MAX_INTERVAL_CEILING: f64 = 36500.0;

/// Default fuzz spread as a fraction of the interval
pub const DEFAULT_FUZZ_FACTOR: f64 = 0.05;

const MINUTES_PER_DAY: f64 = 1440.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

// ============================================================================
// PARAMETER SET
// ============================================================================

/// Which short-step ladder a card is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ladder {
    /// Steps for a card seen for the first time
    Learning,
    /// Steps for a card that lapsed out of Review
    Relearning,
}

/// Weights and scheduling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterSet {
    /// Memory-model weights
    pub weights: Weights,
    /// Desired probability of recall when a card comes due (0, 1)
    pub target_retention: f64,
    /// Minimum long-term interval in days
    pub min_interval: f64,
    /// Maximum long-term interval in days
    pub max_interval: f64,
    /// Spread long-term intervals to avoid due-date clustering
    pub enable_fuzz: bool,
    /// Fuzz spread as a fraction of the interval
    pub fuzz_factor: f64,
    /// Learning ladder, in minutes
    pub learning_steps: Vec<f64>,
    /// Relearning ladder, in minutes
    pub relearning_steps: Vec<f64>,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            target_retention: DEFAULT_RETENTION,
            min_interval: DEFAULT_MIN_INTERVAL,
            max_interval: DEFAULT_MAX_INTERVAL,
            enable_fuzz: true,
            fuzz_factor: DEFAULT_FUZZ_FACTOR,
            learning_steps: vec![1.0, 10.0],
            relearning_steps: vec![10.0],
        }
    }
}

impl ParameterSet {
    /// Parse from JSON and validate. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: ParameterSet = serde_json::from_str(json)
            .map_err(|e| SchedulingError::InvalidParameters(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Load from a JSON file and validate
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SchedulingError::InvalidParameters(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty JSON
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Check every weight and setting against its accepted range
    pub fn validate(&self) -> Result<()> {
        for (i, (&w, &(lo, hi))) in self.weights.iter().zip(WEIGHT_RANGES.iter()).enumerate() {
            if !w.is_finite() || w < lo || w > hi {
                return Err(SchedulingError::InvalidParameters(format!(
                    "weight w[{}] = {} outside [{}, {}]",
                    i, w, lo, hi
                )));
            }
        }

        if !(self.target_retention > 0.0 && self.target_retention < 1.0) {
            return Err(SchedulingError::InvalidParameters(format!(
                "target retention {} must be strictly between 0 and 1",
                self.target_retention
            )));
        }

        if !(self.min_interval.is_finite() && self.min_interval * SECONDS_PER_DAY >= 1.0) {
            return Err(SchedulingError::InvalidParameters(format!(
                "minimum interval {} days must be at least one second",
                self.min_interval
            )));
        }

        if !(self.max_interval.is_finite()
            && self.max_interval >= self.min_interval
            && self.max_interval <= MAX_INTERVAL_CEILING)
        {
            return Err(SchedulingError::InvalidParameters(format!(
                "maximum interval {} must lie in [{}, {}]",
                self.max_interval, self.min_interval, MAX_INTERVAL_CEILING
            )));
        }

        if !(0.0..=0.5).contains(&self.fuzz_factor) {
            return Err(SchedulingError::InvalidParameters(format!(
                "fuzz factor {} must lie in [0, 0.5]",
                self.fuzz_factor
            )));
        }

        validate_ladder("learning", &self.learning_steps)?;
        validate_ladder("relearning", &self.relearning_steps)?;

        Ok(())
    }

    /// Steps (minutes) of the given ladder
    pub fn steps(&self, ladder: Ladder) -> &[f64] {
        match ladder {
            Ladder::Learning => &self.learning_steps,
            Ladder::Relearning => &self.relearning_steps,
        }
    }

    /// Length of the given ladder
    pub fn ladder_len(&self, ladder: Ladder) -> usize {
        self.steps(ladder).len()
    }

    /// Duration of rung `index` in days. Indices past the end use the last rung.
    pub fn step_days(&self, ladder: Ladder, index: usize) -> f64 {
        let steps = self.steps(ladder);
        match steps.get(index).or_else(|| steps.last()) {
            Some(minutes) => minutes / MINUTES_PER_DAY,
            None => 0.0,
        }
    }

    /// Duration of rung `index` as a [`Duration`]
    pub fn step_duration(&self, ladder: Ladder, index: usize) -> Duration {
        days_to_duration(self.step_days(ladder, index))
    }
}

/// Each step must be at least one second and shorter than a day
fn validate_ladder(name: &str, steps: &[f64]) -> Result<()> {
    if steps.is_empty() {
        return Err(SchedulingError::InvalidParameters(format!(
            "{} ladder needs at least one step",
            name
        )));
    }
    for &minutes in steps {
        if !(minutes.is_finite() && minutes * 60.0 >= 1.0 && minutes < MINUTES_PER_DAY) {
            return Err(SchedulingError::InvalidParameters(format!(
                "{} step of {} minutes must be between one second and one day",
                name, minutes
            )));
        }
    }
    Ok(())
}

/// Convert fractional days to a millisecond-precision duration
pub(crate) fn days_to_duration(days: f64) -> Duration {
    Duration::milliseconds((days * 86_400_000.0).round() as i64)
}
