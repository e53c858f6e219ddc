//! Test Database Manager
//!
//! Provides isolated database instances for testing:
//! - Temporary databases that are automatically cleaned up
//! - Pre-seeded databases with test cards
//! - Reopening the same file to check persistence

use brightcards_core::{Card, CardId, DeckId, Grade, Scheduler, Storage};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tempfile::TempDir;

/// Manager for test databases
///
/// Creates isolated database instances for each test to prevent interference.
/// Automatically cleans up temporary databases when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let db = TestDatabaseManager::new_temp();
///
/// // Use the storage
/// db.storage.insert_card(&card)?;
///
/// // Database is automatically deleted when `db` goes out of scope
/// ```
pub struct TestDatabaseManager {
    /// The storage instance
    pub storage: Storage,
    /// Scheduler used by the seeding helpers
    pub scheduler: Scheduler,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: Option<TempDir>,
    /// Path to the database file
    db_path: PathBuf,
}

impl TestDatabaseManager {
    /// Create a new test database in a temporary directory
    ///
    /// The database is automatically deleted when the manager is dropped.
    pub fn new_temp() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_brightcards.db");

        let storage = Storage::new(Some(db_path.clone())).expect("Failed to create test storage");

        Self {
            storage,
            scheduler: Scheduler::default(),
            _temp_dir: Some(temp_dir),
            db_path,
        }
    }

    /// Create a test database at a specific path
    ///
    /// The database is NOT automatically deleted.
    pub fn new_at_path(path: PathBuf) -> Self {
        let storage = Storage::new(Some(path.clone())).expect("Failed to create test storage");

        Self {
            storage,
            scheduler: Scheduler::default(),
            _temp_dir: None,
            db_path: path,
        }
    }

    /// Use a different scheduler for seeding
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Get the database path
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Close and reopen the database file, keeping the temp directory alive
    pub fn reopen(&mut self) {
        self.storage =
            Storage::new(Some(self.db_path.clone())).expect("Failed to reopen test storage");
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.card_count() == 0
    }

    /// Get the number of cards in the database
    pub fn card_count(&self) -> i64 {
        self.storage
            .stats(Utc::now())
            .map(|s| s.total_cards)
            .unwrap_or(0)
    }

    // ========================================================================
    // SEEDING METHODS
    // ========================================================================

    /// Seed `count` new cards into `deck`, all created at `now`
    pub fn seed_cards(&mut self, deck: DeckId, count: usize, now: DateTime<Utc>) -> Vec<CardId> {
        let mut ids = Vec::with_capacity(count);

        for i in 0..count {
            let card = Card::new(deck, now).with_content(format!("card-{}", i));
            if self.storage.insert_card(&card).is_ok() {
                ids.push(card.id);
            }
        }

        ids
    }

    /// Seed one card per lifecycle state: new, learning, review, relearning.
    ///
    /// Reviews are applied at `now` and shortly after; returned ids are in
    /// that state order.
    pub fn seed_with_states(&mut self, deck: DeckId, now: DateTime<Utc>) -> Vec<CardId> {
        let ids = self.seed_cards(deck, 4, now);

        // Learning: one Good review puts it on the second rung
        self.apply(&ids[1], &[Grade::Good], now);

        // Review: Easy then Easy graduates
        self.apply(&ids[2], &[Grade::Easy, Grade::Easy], now);

        // Relearning: graduate, then lapse
        self.apply(&ids[3], &[Grade::Easy, Grade::Easy, Grade::Again], now);

        ids
    }

    /// Apply grades in order, each at the card's due time (or `start` if later)
    pub fn apply(&self, id: &CardId, grades: &[Grade], start: DateTime<Utc>) -> Option<Card> {
        let mut at = start;
        let mut last = None;
        for &grade in grades {
            let outcome = self
                .storage
                .review(id, grade, at, &self.scheduler)
                .expect("Seeding review failed");
            at = outcome.card.due.max(at);
            last = Some(outcome.card);
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brightcards_core::{CardState, CardStore};

    #[test]
    fn test_new_temp_is_empty() {
        let db = TestDatabaseManager::new_temp();
        assert!(db.is_empty());
        assert!(db.path().ends_with("test_brightcards.db"));
    }

    #[test]
    fn test_seed_with_states() {
        let mut db = TestDatabaseManager::new_temp();
        let ids = db.seed_with_states(DeckId::new(), Utc::now());
        assert_eq!(db.card_count(), 4);

        let states: Vec<CardState> = ids
            .iter()
            .map(|id| db.storage.get_card(id).unwrap().unwrap().state)
            .collect();
        assert_eq!(
            states,
            vec![
                CardState::New,
                CardState::Learning,
                CardState::Review,
                CardState::Relearning
            ]
        );
    }

    #[test]
    fn test_reopen_preserves_cards() {
        let mut db = TestDatabaseManager::new_temp();
        db.seed_cards(DeckId::new(), 3, Utc::now());
        db.reopen();
        assert_eq!(db.card_count(), 3);
    }
}
