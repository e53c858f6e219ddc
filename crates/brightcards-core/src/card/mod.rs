//! Card module - scheduling snapshots and review records
//!
//! - [`Card`]: per-card scheduling state, owned by the store
//! - [`ReviewLog`]: append-only record of a single review
//! - [`DifficultyLabel`]: display label derived from numeric difficulty

mod model;
mod review_log;

pub use model::{Card, CardId, CardState, DeckId, DifficultyLabel};
pub use review_log::ReviewLog;
