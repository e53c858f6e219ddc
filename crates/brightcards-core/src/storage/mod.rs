//! Storage Module
//!
//! Reference card store on SQLite:
//! - Card snapshots and the append-only review log
//! - Atomic load → review → save for a single card
//! - Due queries, optionally per deck
//!
//! The scheduler never depends on this module; anything implementing
//! [`CardStore`] can host it.

mod migrations;
mod sqlite;

pub use migrations::MIGRATIONS;
pub use sqlite::{CardStats, Result, Storage, StorageError};

use crate::card::{Card, CardId, ReviewLog};

/// What the engine needs from a persistent store
pub trait CardStore {
    /// Load a card snapshot
    fn get_card(&self, id: &CardId) -> Result<Option<Card>>;

    /// Persist an updated snapshot and append its review log
    fn save_review(&self, card: &Card, log: &ReviewLog) -> Result<()>;
}
