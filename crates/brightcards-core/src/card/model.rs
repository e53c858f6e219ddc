//! Card - the unit the scheduler works on
//!
//! A card snapshot carries only what scheduling needs: identity, deck
//! membership, the FSRS state, and timing. Front/back text lives elsewhere;
//! `content` is an opaque reference the engine never reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fsrs::{SchedulingError, MAX_DIFFICULTY, MIN_DIFFICULTY};

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Opaque card identifier (UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(Uuid);

impl CardId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Seed for per-card deterministic randomness
    pub(crate) fn seed(&self) -> u64 {
        let (hi, lo) = self.0.as_u64_pair();
        hi ^ lo
    }
}

impl Default for CardId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CardId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Opaque deck identifier (UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckId(Uuid);

impl DeckId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DeckId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DeckId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// ============================================================================
// CARD STATE
// ============================================================================

/// Where a card sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    /// Never reviewed
    #[default]
    New,
    /// Working through the initial short-step ladder
    Learning,
    /// Scheduled by the long-term memory model
    Review,
    /// Lapsed out of Review, working through the relearning ladder
    Relearning,
}

impl CardState {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CardState::New => "new",
            CardState::Learning => "learning",
            CardState::Review => "review",
            CardState::Relearning => "relearning",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "new" => Some(CardState::New),
            "learning" => Some(CardState::Learning),
            "review" => Some(CardState::Review),
            "relearning" => Some(CardState::Relearning),
            _ => None,
        }
    }
}

impl std::fmt::Display for CardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DIFFICULTY LABEL
// ============================================================================

/// User-facing difficulty label.
///
/// Always derived from the numeric difficulty; never stored.
/// D < 4 is Easy, 4 ≤ D < 7 is Normal, D ≥ 7 is Hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DifficultyLabel {
    Easy,
    Normal,
    Hard,
}

impl DifficultyLabel {
    pub fn from_difficulty(difficulty: f64) -> Self {
        if difficulty < 4.0 {
            DifficultyLabel::Easy
        } else if difficulty < 7.0 {
            DifficultyLabel::Normal
        } else {
            DifficultyLabel::Hard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLabel::Easy => "Easy",
            DifficultyLabel::Normal => "Normal",
            DifficultyLabel::Hard => "Hard",
        }
    }
}

impl std::fmt::Display for DifficultyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CARD
// ============================================================================

/// A flashcard's scheduling snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Unique identifier
    pub id: CardId,
    /// Owning deck
    pub deck_id: DeckId,
    /// Opaque content reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Lifecycle state
    pub state: CardState,
    /// Memory stability in days; `None` while New
    pub stability: Option<f64>,
    /// Difficulty in [1, 10]; `None` while New
    pub difficulty: Option<f64>,
    /// When the card becomes eligible for review
    pub due: DateTime<Utc>,
    /// Most recent review, if any
    pub last_review: Option<DateTime<Utc>>,
    /// Reviews performed
    pub reps: u32,
    /// Times the card lapsed out of Review
    pub lapses: u32,
    /// Interval (days) chosen at the most recent review
    pub scheduled_days: f64,
    /// Current rung on the learning/relearning ladder (0 elsewhere)
    pub step: u32,
    /// When the card was created
    pub created_at: DateTime<Utc>,
}

impl Card {
    /// Create a New card in `deck_id`, due immediately
    pub fn new(deck_id: DeckId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: CardId::new(),
            deck_id,
            content: None,
            state: CardState::New,
            stability: None,
            difficulty: None,
            due: created_at,
            last_review: None,
            reps: 0,
            lapses: 0,
            scheduled_days: 0.0,
            step: 0,
            created_at,
        }
    }

    /// Attach an opaque content reference
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn is_new(&self) -> bool {
        self.state == CardState::New
    }

    /// Eligible for review at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due <= now
    }

    /// Derived label, absent for New cards
    pub fn difficulty_label(&self) -> Option<DifficultyLabel> {
        self.difficulty.map(DifficultyLabel::from_difficulty)
    }

    /// Check the data-model invariants a stored snapshot must satisfy
    pub fn validate(&self) -> Result<(), SchedulingError> {
        let invalid = |reason: String| SchedulingError::InvalidCard {
            card: self.id.to_string(),
            reason,
        };

        if self.state != CardState::New {
            match self.stability {
                Some(s) if s.is_finite() && s > 0.0 => {}
                Some(s) => return Err(invalid(format!("stability {} is not positive", s))),
                None => return Err(invalid(format!("{} card has no stability", self.state))),
            }
            match self.difficulty {
                Some(d) if (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&d) => {}
                Some(d) => return Err(invalid(format!("difficulty {} outside [1, 10]", d))),
                None => return Err(invalid(format!("{} card has no difficulty", self.state))),
            }
            if self.last_review.is_none() {
                return Err(invalid(format!("{} card was never reviewed", self.state)));
            }
        }

        if let Some(last) = self.last_review {
            if self.due < last {
                return Err(invalid("due before last review".to_string()));
            }
        }

        if !(self.scheduled_days.is_finite() && self.scheduled_days >= 0.0) {
            return Err(invalid(format!(
                "scheduled interval {} must be finite and non-negative",
                self.scheduled_days
            )));
        }

        Ok(())
    }
}
