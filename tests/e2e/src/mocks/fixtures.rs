//! Test Data Factory
//!
//! Provides utilities for generating realistic test data:
//! - Cards in any lifecycle state, built directly or through real reviews
//! - Batch generation across decks
//! - Pre-built scenarios for common test cases

use std::collections::HashMap;

use brightcards_core::{Card, CardState, DeckId, Grade, Scheduler, Storage};
use chrono::{DateTime, Duration, Utc};

/// Factory for creating test data
///
/// # Example
///
/// ```rust,ignore
/// let storage = Storage::new(Some(path))?;
///
/// // Create a single card
/// let card = TestDataFactory::create_card(&storage, deck, "front/back", now);
///
/// // A Review card with a known memory state, not stored
/// let card = TestDataFactory::review_card(10.0, 5.0, now - Duration::days(10));
/// ```
pub struct TestDataFactory;

/// Configuration for batch card generation
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of cards to create
    pub count: usize,
    /// Decks to spread cards across (round-robin); a fresh deck when empty
    pub decks: Vec<DeckId>,
    /// Base content prefix
    pub content_prefix: String,
    /// Creation time of the first card
    pub created_at: DateTime<Utc>,
    /// Gap between successive creation (and due) times
    pub spacing: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            count: 10,
            decks: vec![],
            content_prefix: "Test card".to_string(),
            created_at: Utc::now() - Duration::days(1),
            spacing: Duration::minutes(1),
        }
    }
}

/// Scenario containing related test data
#[derive(Debug)]
pub struct TestScenario {
    /// Cards in the scenario
    pub cards: Vec<Card>,
    /// Description of the scenario
    pub description: String,
    /// Named cards for test assertions
    pub metadata: HashMap<String, Card>,
}

impl TestDataFactory {
    // ========================================================================
    // SINGLE CARD CREATION
    // ========================================================================

    /// Create and store a new card
    pub fn create_card(
        storage: &Storage,
        deck: DeckId,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Card {
        let card = Card::new(deck, created_at).with_content(content);
        storage.insert_card(&card).expect("Failed to insert card");
        card
    }

    /// A Review-state card with the given memory state, due at the
    /// target-retention interval. Not stored.
    pub fn review_card(stability: f64, difficulty: f64, last_review: DateTime<Utc>) -> Card {
        let mut card = Card::new(DeckId::new(), last_review - Duration::days(30));
        card.state = CardState::Review;
        card.stability = Some(stability);
        card.difficulty = Some(difficulty);
        card.last_review = Some(last_review);
        card.due = last_review + Duration::milliseconds((stability * 86_400_000.0) as i64);
        card.scheduled_days = stability.round();
        card.reps = 4;
        card
    }

    /// A new card due at `due`. Not stored.
    pub fn card_due_at(deck: DeckId, due: DateTime<Utc>) -> Card {
        let mut card = Card::new(deck, due - Duration::days(1));
        card.due = due;
        card
    }

    // ========================================================================
    // BATCH CREATION
    // ========================================================================

    /// Create a batch of cards with default configuration
    pub fn create_batch(storage: &Storage, count: usize) -> Vec<Card> {
        Self::create_batch_with_config(
            storage,
            BatchConfig {
                count,
                ..Default::default()
            },
        )
    }

    /// Create a batch of cards with custom configuration
    pub fn create_batch_with_config(storage: &Storage, config: BatchConfig) -> Vec<Card> {
        let decks = if config.decks.is_empty() {
            vec![DeckId::new()]
        } else {
            config.decks
        };

        (0..config.count)
            .map(|i| {
                let deck = decks[i % decks.len()];
                let created_at = config.created_at + config.spacing * i as i32;
                Self::create_card(
                    storage,
                    deck,
                    &format!("{} {}", config.content_prefix, i),
                    created_at,
                )
            })
            .collect()
    }

    // ========================================================================
    // SCENARIOS
    // ========================================================================

    /// Cards in every lifecycle state, driven there by real reviews
    pub fn create_scheduling_scenario(
        storage: &Storage,
        scheduler: &Scheduler,
        now: DateTime<Utc>,
    ) -> TestScenario {
        let deck = DeckId::new();
        let mut metadata = HashMap::new();

        let plans: [(&str, &[Grade]); 4] = [
            ("new", &[]),
            ("learning", &[Grade::Again]),
            ("review", &[Grade::Good, Grade::Good]),
            ("relearning", &[Grade::Good, Grade::Good, Grade::Again]),
        ];

        for (name, grades) in plans {
            let card = Self::create_card(storage, deck, &format!("{} card", name), now);
            let card = Self::review_sequence(storage, scheduler, card, grades, now);
            metadata.insert(name.to_string(), card);
        }

        let mut cards: Vec<Card> = metadata.values().cloned().collect();
        cards.sort_by_key(|c| c.created_at);

        TestScenario {
            cards,
            description: "Scheduling scenario with cards in different learning states".to_string(),
            metadata,
        }
    }

    /// Review `card` with each grade in turn, each at its due time
    pub fn review_sequence(
        storage: &Storage,
        scheduler: &Scheduler,
        card: Card,
        grades: &[Grade],
        start: DateTime<Utc>,
    ) -> Card {
        let mut card = card;
        let mut at = start;
        for &grade in grades {
            card = storage
                .review(&card.id, grade, at, scheduler)
                .expect("Scenario review failed")
                .card;
            at = card.due.max(at);
        }
        card
    }

    // ========================================================================
    // UTILITY METHODS
    // ========================================================================

    /// Deterministic grade sequence, mostly successes with periodic lapses
    pub fn grade_sequence(len: usize, seed: usize) -> Vec<Grade> {
        const PATTERN: [Grade; 10] = [
            Grade::Good,
            Grade::Good,
            Grade::Hard,
            Grade::Good,
            Grade::Easy,
            Grade::Again,
            Grade::Good,
            Grade::Hard,
            Grade::Good,
            Grade::Again,
        ];

        (0..len).map(|i| PATTERN[(seed + i * 3) % PATTERN.len()]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn create_test_storage() -> (Storage, TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        (Storage::new(Some(db_path)).unwrap(), dir)
    }

    #[test]
    fn test_create_card() {
        let (storage, _dir) = create_test_storage();
        let card = TestDataFactory::create_card(&storage, DeckId::new(), "test content", Utc::now());
        assert_eq!(card.content.as_deref(), Some("test content"));
        assert!(card.is_new());
    }

    #[test]
    fn test_batch_round_robin() {
        let (storage, _dir) = create_test_storage();
        let decks = vec![DeckId::new(), DeckId::new()];
        let cards = TestDataFactory::create_batch_with_config(
            &storage,
            BatchConfig {
                count: 5,
                decks: decks.clone(),
                ..Default::default()
            },
        );
        assert_eq!(cards.len(), 5);
        assert_eq!(cards.iter().filter(|c| c.deck_id == decks[0]).count(), 3);
    }

    #[test]
    fn test_scheduling_scenario_states() {
        let (storage, _dir) = create_test_storage();
        let scenario =
            TestDataFactory::create_scheduling_scenario(&storage, &Scheduler::default(), Utc::now());
        assert_eq!(scenario.cards.len(), 4);
        assert_eq!(scenario.metadata["new"].state, CardState::New);
        assert_eq!(scenario.metadata["learning"].state, CardState::Learning);
        assert_eq!(scenario.metadata["review"].state, CardState::Review);
        assert_eq!(scenario.metadata["relearning"].state, CardState::Relearning);
    }

    #[test]
    fn test_review_card_is_valid() {
        let card = TestDataFactory::review_card(10.0, 5.0, Utc::now());
        assert!(card.validate().is_ok());
    }
}
