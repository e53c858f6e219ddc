//! Journey: a card's full life from creation through lapses and recovery,
//! persisted through the SQLite store.

use std::sync::Arc;

use brightcards_core::{CardState, CardStore, DeckId, Grade, Scheduler, SchedulingError, StorageError};
use brightcards_e2e_tests::{TestDataFactory, TestDatabaseManager};
use chrono::{Duration, Utc};

#[test]
fn test_new_card_to_review_and_back() {
    let db = TestDatabaseManager::new_temp();
    let scheduler = Scheduler::default();
    let now = Utc::now();
    let card = TestDataFactory::create_card(&db.storage, DeckId::new(), "capital of France", now);

    // New + Good: onto the learning ladder, due within minutes
    let first = db.storage.review(&card.id, Grade::Good, now, &scheduler).unwrap();
    assert_eq!(first.card.state, CardState::Learning);
    assert!(first.card.due > now);
    assert!(first.card.due - now <= Duration::hours(1));
    let s = first.card.stability.unwrap();
    assert!(s.is_finite() && s > 0.0);

    // Finish the ladder
    let at = first.card.due;
    let second = db.storage.review(&card.id, Grade::Good, at, &scheduler).unwrap();
    assert_eq!(second.card.state, CardState::Review);
    assert!(second.card.scheduled_days >= 1.0);

    // Forget it
    let at = second.card.due + Duration::days(3);
    let lapse = db.storage.review(&card.id, Grade::Again, at, &scheduler).unwrap();
    assert_eq!(lapse.card.state, CardState::Relearning);
    assert_eq!(lapse.card.lapses, 1);
    assert!(lapse.card.stability.unwrap() <= second.card.stability.unwrap());

    // Relearn
    let at = lapse.card.due;
    let back = db.storage.review(&card.id, Grade::Good, at, &scheduler).unwrap();
    assert_eq!(back.card.state, CardState::Review);
    assert_eq!(back.card.reps, 4);

    let stored = db.storage.get_card(&card.id).unwrap().unwrap();
    assert_eq!(stored, back.card);

    let logs = db.storage.review_logs(&card.id).unwrap();
    assert_eq!(logs.len(), 4);
    assert_eq!(logs.iter().filter(|l| l.is_lapse()).count(), 1);
    assert_eq!(logs[0].state_before, CardState::New);
    assert_eq!(logs[3].state_after, CardState::Review);
}

#[test]
fn test_lapse_after_overdue_review() {
    let db = TestDatabaseManager::new_temp();
    let now = Utc::now();
    let card = TestDataFactory::review_card(10.0, 5.0, now - Duration::days(12));
    db.storage.insert_card(&card).unwrap();

    let outcome = db
        .storage
        .review(&card.id, Grade::Again, now, &Scheduler::default())
        .unwrap();

    assert_eq!(outcome.card.state, CardState::Relearning);
    assert_eq!(outcome.card.lapses, card.lapses + 1);
    assert!(outcome.card.stability.unwrap() < 10.0);
    assert!((outcome.log.elapsed_days - 12.0).abs() < 1e-6);
    assert!(outcome.log.retrievability.unwrap() < 0.9);
}

#[test]
fn test_success_at_target_retention_grows_interval() {
    let db = TestDatabaseManager::new_temp();
    let now = Utc::now();
    let card = TestDataFactory::review_card(10.0, 5.0, now - Duration::days(10));
    db.storage.insert_card(&card).unwrap();

    let outcome = db
        .storage
        .review(&card.id, Grade::Good, card.due, &Scheduler::default())
        .unwrap();

    assert_eq!(outcome.card.state, CardState::Review);
    assert!(outcome.card.stability.unwrap() > 10.0);
    assert!(outcome.card.due > card.due);
}

#[test]
fn test_invariants_hold_over_long_history() {
    let db = TestDatabaseManager::new_temp();
    let scheduler = Scheduler::default();
    let now = Utc::now();
    let card = TestDataFactory::create_card(&db.storage, DeckId::new(), "long history", now);

    let grades = TestDataFactory::grade_sequence(60, 1);
    let mut at = now;
    let mut lapses = 0;
    for grade in &grades {
        let before = db.storage.get_card(&card.id).unwrap().unwrap();
        let outcome = db.storage.review(&card.id, *grade, at, &scheduler).unwrap();
        let after = &outcome.card;

        assert!(after.due > at);
        assert!(after.reps == before.reps + 1);
        assert!(after.lapses >= before.lapses);
        assert_ne!(after.state, CardState::New);
        let d = after.difficulty.unwrap();
        assert!((1.0..=10.0).contains(&d));
        assert!(after.stability.unwrap() > 0.0);
        if outcome.log.is_lapse() {
            lapses += 1;
        }
        at = after.due;
    }

    let stored = db.storage.get_card(&card.id).unwrap().unwrap();
    assert_eq!(stored.reps as usize, grades.len());
    assert_eq!(stored.lapses, lapses);
    assert_eq!(db.storage.review_logs(&card.id).unwrap().len(), grades.len());
}

#[test]
fn test_out_of_order_review_rejected() {
    let db = TestDatabaseManager::new_temp();
    let scheduler = Scheduler::default();
    let now = Utc::now();
    let card = TestDataFactory::create_card(&db.storage, DeckId::new(), "ordering", now);
    let first = db.storage.review(&card.id, Grade::Good, now, &scheduler).unwrap();

    let err = db
        .storage
        .review(&card.id, Grade::Easy, now - Duration::minutes(5), &scheduler)
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Scheduling(SchedulingError::ReviewBeforeLastReview { .. })
    ));
    assert_eq!(db.storage.get_card(&card.id).unwrap().unwrap(), first.card);
}

#[test]
fn test_concurrent_reviews_of_different_cards() {
    let db = TestDatabaseManager::new_temp();
    let scheduler = Arc::new(Scheduler::default());
    let now = Utc::now();
    let cards = TestDataFactory::create_batch(&db.storage, 16);
    let storage = &db.storage;

    std::thread::scope(|s| {
        for card in &cards {
            let scheduler = Arc::clone(&scheduler);
            s.spawn(move || {
                storage
                    .review(&card.id, Grade::Good, now, &scheduler)
                    .unwrap();
            });
        }
    });

    for card in &cards {
        let stored = storage.get_card(&card.id).unwrap().unwrap();
        assert_eq!(stored.reps, 1);
        assert_eq!(storage.review_logs(&card.id).unwrap().len(), 1);
    }
}
