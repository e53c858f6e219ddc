//! SQLite Storage Implementation
//!
//! Card snapshots, review logs, and the transactional review path.

use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

use super::CardStore;
use crate::card::{Card, CardId, CardState, DeckId, ReviewLog};
use crate::fsrs::{retrievability, Grade, ReviewOutcome, Scheduler, SchedulingError};
use crate::queue::DueQueue;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error, including rows that fail to decode
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Card not found
    #[error("Card not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Scheduler rejected the review or the snapshot
    #[error("Scheduling error: {0}")]
    Scheduling(#[from] SchedulingError),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Collection-wide counts and averages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStats {
    pub total_cards: i64,
    pub new_cards: i64,
    pub learning_cards: i64,
    pub review_cards: i64,
    pub relearning_cards: i64,
    /// Cards with `due <= now`
    pub due_cards: i64,
    pub total_reviews: i64,
    pub total_lapses: i64,
    /// Over cards that have been reviewed at least once
    pub average_difficulty: Option<f64>,
    pub average_stability: Option<f64>,
    /// Mean recall probability at `now`
    pub average_retrievability: Option<f64>,
}

const CARD_COLUMNS: &str = "id, deck_id, content, state, stability, difficulty, due, \
     last_review, reps, lapses, scheduled_days, step, created_at";

const LOG_COLUMNS: &str = "card_id, grade, reviewed_at, elapsed_days, state_before, \
     state_after, stability_before, stability_after, difficulty_before, difficulty_after, \
     retrievability, scheduled_days";

// ============================================================================
// STORAGE
// ============================================================================

/// SQLite card store
///
/// Uses separate reader/writer connections for interior mutability.
/// All methods take `&self`, making Storage `Send + Sync`. Every write goes
/// through the writer lock, which serializes reviews of the same card.
pub struct Storage {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

impl Storage {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;
             PRAGMA temp_store = MEMORY;",
        )?;
        Ok(())
    }

    /// Open (or create) the database at `db_path`, or at the platform data
    /// directory when `None`
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "brightcards", "core").ok_or_else(|| {
                    StorageError::Init("Could not determine project directories".to_string())
                })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                // Restrict directory permissions to owner-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(data_dir, perms);
                }
                data_dir.join("brightcards.db")
            }
        };

        let writer_conn = Connection::open(&path)?;

        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        let applied = super::migrations::apply_migrations(&writer_conn)?;
        if applied > 0 {
            tracing::info!("Database ready at {} ({} migrations applied)", path.display(), applied);
        }

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
        })
    }

    fn lock_reader(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))
    }

    fn lock_writer(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))
    }

    /// Add a card
    pub fn insert_card(&self, card: &Card) -> Result<()> {
        card.validate()?;
        let now = format_timestamp(&Utc::now());

        let writer = self.lock_writer()?;
        writer.execute(
            &format!(
                "INSERT INTO cards ({}, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                CARD_COLUMNS
            ),
            params![
                card.id.to_string(),
                card.deck_id.to_string(),
                card.content,
                card.state.as_str(),
                card.stability,
                card.difficulty,
                format_timestamp(&card.due),
                card.last_review.as_ref().map(format_timestamp),
                card.reps,
                card.lapses,
                card.scheduled_days,
                card.step,
                format_timestamp(&card.created_at),
                now,
            ],
        )?;

        tracing::debug!("Inserted card {} into deck {}", card.id, card.deck_id);
        Ok(())
    }

    /// All cards, optionally limited to one deck, in creation order
    pub fn cards(&self, deck: Option<DeckId>) -> Result<Vec<Card>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(&format!(
            "SELECT {} FROM cards
             WHERE (?1 IS NULL OR deck_id = ?1)
             ORDER BY created_at, id",
            CARD_COLUMNS
        ))?;

        let rows = stmt.query_map(params![deck.map(|d| d.to_string())], row_to_card)?;

        let mut result = Vec::new();
        for card in rows {
            result.push(card?);
        }
        Ok(result)
    }

    /// Due queue at `now`: due ascending, ties by card id
    pub fn due_cards(
        &self,
        deck: Option<DeckId>,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<Card>> {
        let candidates = {
            let reader = self.lock_reader()?;
            let mut stmt = reader.prepare(&format!(
                "SELECT {} FROM cards
                 WHERE due <= ?1 AND (?2 IS NULL OR deck_id = ?2)",
                CARD_COLUMNS
            ))?;

            let rows = stmt.query_map(
                params![format_timestamp(&now), deck.map(|d| d.to_string())],
                row_to_card,
            )?;

            let mut result = Vec::new();
            for card in rows {
                result.push(card?);
            }
            result
        };

        let mut queue = DueQueue::new();
        if let Some(deck) = deck {
            queue = queue.deck(deck);
        }
        if let Some(limit) = limit {
            queue = queue.limit(limit);
        }

        Ok(queue.build(&candidates, now).into_iter().cloned().collect())
    }

    /// Review history for one card, oldest first
    pub fn review_logs(&self, card_id: &CardId) -> Result<Vec<ReviewLog>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(&format!(
            "SELECT {} FROM review_logs WHERE card_id = ?1 ORDER BY reviewed_at, id",
            LOG_COLUMNS
        ))?;

        let rows = stmt.query_map(params![card_id.to_string()], row_to_log)?;

        let mut result = Vec::new();
        for log in rows {
            result.push(log?);
        }
        Ok(result)
    }

    /// Resolve a card, apply the review, and persist card and log atomically.
    ///
    /// Nothing is written if the scheduler rejects the review.
    pub fn review(
        &self,
        id: &CardId,
        grade: Grade,
        reviewed_at: DateTime<Utc>,
        scheduler: &Scheduler,
    ) -> Result<ReviewOutcome> {
        let mut writer = self.lock_writer()?;
        let tx = writer.transaction()?;

        let card = tx
            .query_row(
                &format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS),
                params![id.to_string()],
                row_to_card,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        let outcome = scheduler.submit_review(&card, grade, reviewed_at)?;
        update_card(&tx, &outcome.card)?;
        insert_log(&tx, &outcome.log)?;
        tx.commit()?;

        tracing::debug!(
            "Reviewed card {} as {}: {} -> {}, due {}",
            id,
            grade,
            outcome.log.state_before,
            outcome.card.state,
            outcome.card.due
        );

        Ok(outcome)
    }

    /// Collection statistics as of `now`
    pub fn stats(&self, now: DateTime<Utc>) -> Result<CardStats> {
        let reader = self.lock_reader()?;
        let mut stats = CardStats::default();

        {
            let mut stmt = reader.prepare("SELECT state, COUNT(*) FROM cards GROUP BY state")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (state, count) = row?;
                match CardState::parse_name(&state) {
                    Some(CardState::New) => stats.new_cards = count,
                    Some(CardState::Learning) => stats.learning_cards = count,
                    Some(CardState::Review) => stats.review_cards = count,
                    Some(CardState::Relearning) => stats.relearning_cards = count,
                    None => tracing::warn!("Ignoring {} cards with unknown state '{}'", count, state),
                }
                stats.total_cards += count;
            }
        }

        stats.due_cards = reader.query_row(
            "SELECT COUNT(*) FROM cards WHERE due <= ?1",
            params![format_timestamp(&now)],
            |row| row.get(0),
        )?;

        stats.total_reviews =
            reader.query_row("SELECT COUNT(*) FROM review_logs", [], |row| row.get(0))?;

        let (lapses, difficulty, stability): (i64, Option<f64>, Option<f64>) = reader.query_row(
            "SELECT COALESCE(SUM(lapses), 0), AVG(difficulty), AVG(stability) FROM cards",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        stats.total_lapses = lapses;
        stats.average_difficulty = difficulty;
        stats.average_stability = stability;

        let mut stmt = reader.prepare(
            "SELECT stability, last_review FROM cards
             WHERE stability IS NOT NULL AND last_review IS NOT NULL",
        )?;
        let rows = stmt.query_map([], |row| {
            let stability: f64 = row.get(0)?;
            let last: String = row.get(1)?;
            Ok((stability, parse_timestamp(&last, "last_review")?))
        })?;

        let mut sum = 0.0;
        let mut n = 0usize;
        for row in rows {
            let (stability, last) = row?;
            let elapsed = (now - last).num_milliseconds() as f64 / 86_400_000.0;
            sum += retrievability(elapsed, stability);
            n += 1;
        }
        if n > 0 {
            stats.average_retrievability = Some(sum / n as f64);
        }

        Ok(stats)
    }
}

impl CardStore for Storage {
    fn get_card(&self, id: &CardId) -> Result<Option<Card>> {
        let reader = self.lock_reader()?;
        let card = reader
            .query_row(
                &format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS),
                params![id.to_string()],
                row_to_card,
            )
            .optional()?;
        Ok(card)
    }

    fn save_review(&self, card: &Card, log: &ReviewLog) -> Result<()> {
        card.validate()?;

        let mut writer = self.lock_writer()?;
        let tx = writer.transaction()?;
        if update_card(&tx, card)? == 0 {
            return Err(StorageError::NotFound(card.id.to_string()));
        }
        insert_log(&tx, log)?;
        tx.commit()?;
        Ok(())
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

/// Fixed-width RFC3339 so text comparison matches time order
fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn invalid_column(field: &str, value: &str, reason: impl std::fmt::Display) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Invalid {} '{}': {}", field, value, reason),
        )),
    )
}

/// Parse RFC3339 timestamp
fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| invalid_column(field_name, value, e))
}

fn parse_state(value: &str, field_name: &str) -> rusqlite::Result<CardState> {
    CardState::parse_name(value).ok_or_else(|| invalid_column(field_name, value, "unknown state"))
}

/// Convert a row to Card
fn row_to_card(row: &rusqlite::Row) -> rusqlite::Result<Card> {
    let id: String = row.get("id")?;
    let deck_id: String = row.get("deck_id")?;
    let state: String = row.get("state")?;
    let due: String = row.get("due")?;
    let last_review: Option<String> = row.get("last_review")?;
    let created_at: String = row.get("created_at")?;

    Ok(Card {
        id: id.parse().map_err(|e| invalid_column("id", &id, e))?,
        deck_id: deck_id
            .parse()
            .map_err(|e| invalid_column("deck_id", &deck_id, e))?,
        content: row.get("content")?,
        state: parse_state(&state, "state")?,
        stability: row.get("stability")?,
        difficulty: row.get("difficulty")?,
        due: parse_timestamp(&due, "due")?,
        last_review: last_review
            .map(|s| parse_timestamp(&s, "last_review"))
            .transpose()?,
        reps: row.get("reps")?,
        lapses: row.get("lapses")?,
        scheduled_days: row.get("scheduled_days")?,
        step: row.get("step")?,
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}

/// Convert a row to ReviewLog
fn row_to_log(row: &rusqlite::Row) -> rusqlite::Result<ReviewLog> {
    let card_id: String = row.get("card_id")?;
    let grade: u8 = row.get("grade")?;
    let reviewed_at: String = row.get("reviewed_at")?;
    let state_before: String = row.get("state_before")?;
    let state_after: String = row.get("state_after")?;

    Ok(ReviewLog {
        card_id: card_id
            .parse()
            .map_err(|e| invalid_column("card_id", &card_id, e))?,
        grade: Grade::from_u8(grade)
            .ok_or_else(|| invalid_column("grade", &grade.to_string(), "expected 1-4"))?,
        reviewed_at: parse_timestamp(&reviewed_at, "reviewed_at")?,
        elapsed_days: row.get("elapsed_days")?,
        state_before: parse_state(&state_before, "state_before")?,
        state_after: parse_state(&state_after, "state_after")?,
        stability_before: row.get("stability_before")?,
        stability_after: row.get("stability_after")?,
        difficulty_before: row.get("difficulty_before")?,
        difficulty_after: row.get("difficulty_after")?,
        retrievability: row.get("retrievability")?,
        scheduled_days: row.get("scheduled_days")?,
    })
}

fn update_card(conn: &Connection, card: &Card) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE cards SET
            state = ?1,
            stability = ?2,
            difficulty = ?3,
            due = ?4,
            last_review = ?5,
            reps = ?6,
            lapses = ?7,
            scheduled_days = ?8,
            step = ?9,
            updated_at = ?10
        WHERE id = ?11",
        params![
            card.state.as_str(),
            card.stability,
            card.difficulty,
            format_timestamp(&card.due),
            card.last_review.as_ref().map(format_timestamp),
            card.reps,
            card.lapses,
            card.scheduled_days,
            card.step,
            format_timestamp(&Utc::now()),
            card.id.to_string(),
        ],
    )
}

fn insert_log(conn: &Connection, log: &ReviewLog) -> rusqlite::Result<usize> {
    conn.execute(
        &format!(
            "INSERT INTO review_logs ({})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            LOG_COLUMNS
        ),
        params![
            log.card_id.to_string(),
            log.grade.value(),
            format_timestamp(&log.reviewed_at),
            log.elapsed_days,
            log.state_before.as_str(),
            log.state_after.as_str(),
            log.stability_before,
            log.stability_after,
            log.difficulty_before,
            log.difficulty_after,
            log.retrievability,
            log.scheduled_days,
        ],
    )
}
