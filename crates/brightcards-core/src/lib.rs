//! # Brightcards Core
//!
//! Scheduling engine for flashcards. Decides when each card is next due and
//! how a review updates its memory model:
//!
//! - **FSRS memory model**: stability, difficulty, and retrievability from 17 weights
//! - **Card state machine**: New → Learning → Review ⇄ Relearning with short-step ladders
//! - **Scheduler**: one review in, updated card plus an append-only review log out
//! - **Due queues**: deterministic ordering across cards and decks
//! - **Reference store**: SQLite-backed card store with atomic reviews
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use brightcards_core::{Card, CardStore, DeckId, Grade, Scheduler, Storage};
//! use chrono::Utc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Create storage (uses default platform-specific location)
//! let storage = Storage::new(None)?;
//! let scheduler = Scheduler::default();
//!
//! // Add a card
//! let card = Card::new(DeckId::new(), Utc::now());
//! storage.insert_card(&card)?;
//!
//! // Review it
//! let outcome = storage.review(&card.id, Grade::Good, Utc::now(), &scheduler)?;
//! println!("next due {}", outcome.card.due);
//!
//! // What is due now?
//! let due = storage.due_cards(None, Utc::now(), Some(20))?;
//! # let _ = (due, storage.get_card(&card.id)?);
//! # Ok(())
//! # }
//! ```
//!
//! The scheduler itself is pure: it never reads a clock or touches storage,
//! so it can be driven from any host that implements [`CardStore`].
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): compile SQLite into the crate

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod card;
pub mod fsrs;
pub mod queue;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Card types
pub use card::{Card, CardId, CardState, DeckId, DifficultyLabel, ReviewLog};

// FSRS scheduling
pub use fsrs::{
    initial_difficulty,
    initial_stability,
    next_interval,
    // Core functions for advanced usage
    retrievability,
    ErrorKind,
    Grade,
    Ladder,
    ParameterSet,
    PreviewResults,
    ReviewOutcome,
    Scheduler,
    SchedulingError,
    Transition,
};

// Due queue
pub use queue::{build_due_queue, due_count, DueQueue};

// Storage layer
pub use storage::{CardStats, CardStore, Result, Storage, StorageError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// FSRS generation of the default weights (first 17 slots)
pub const FSRS_VERSION: u8 = 5;

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        Card, CardId, CardState, CardStore, DeckId, DueQueue, Grade, ParameterSet,
        ReviewOutcome, Scheduler, SchedulingError, Storage, StorageError,
    };
}
