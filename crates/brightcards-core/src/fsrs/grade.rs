//! Review grades

use serde::{Deserialize, Serialize};

use super::error::SchedulingError;

/// Self-reported recall quality for one review.
///
/// The numeric encoding (1-4) feeds directly into the memory model formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Grade {
    /// Forgot the answer
    Again = 1,
    /// Recalled with serious difficulty
    Hard = 2,
    /// Recalled correctly with normal effort
    Good = 3,
    /// Recalled effortlessly
    Easy = 4,
}

impl Grade {
    /// All grades, worst to best
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    /// Numeric encoding (1-4)
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Numeric encoding as a float, for use inside formulas
    pub fn as_f64(self) -> f64 {
        f64::from(self.value())
    }

    /// Zero-based index into per-grade weight slots
    pub(crate) fn index(self) -> usize {
        usize::from(self.value() - 1)
    }

    /// Parse from the numeric encoding
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Grade::Again),
            2 => Some(Grade::Hard),
            3 => Some(Grade::Good),
            4 => Some(Grade::Easy),
            _ => None,
        }
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Again => "again",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<u8> for Grade {
    type Error = SchedulingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Grade::from_u8(value).ok_or_else(|| SchedulingError::InvalidGrade(value.to_string()))
    }
}

impl std::str::FromStr for Grade {
    type Err = SchedulingError;

    /// Accepts `1`-`4` or a case-insensitive name. `normal` is an alias for `good`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "again" => Ok(Grade::Again),
            "2" | "hard" => Ok(Grade::Hard),
            "3" | "good" | "normal" => Ok(Grade::Good),
            "4" | "easy" => Ok(Grade::Easy),
            _ => Err(SchedulingError::InvalidGrade(s.to_string())),
        }
    }
}
