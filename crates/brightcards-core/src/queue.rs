//! Due Queue
//!
//! Point-in-time view of which cards are ready for review. A card is
//! eligible when `due <= now`, whatever its state; eligible cards are
//! ordered by due date, ties broken by card id so the order is stable.

use chrono::{DateTime, Utc};

use crate::card::{Card, DeckId};

/// Every card due at `now`, oldest first
pub fn build_due_queue<'a, I>(cards: I, now: DateTime<Utc>) -> Vec<&'a Card>
where
    I: IntoIterator<Item = &'a Card>,
{
    DueQueue::new().build(cards, now)
}

/// Number of cards due at `now`
pub fn due_count<'a, I>(cards: I, now: DateTime<Utc>) -> usize
where
    I: IntoIterator<Item = &'a Card>,
{
    DueQueue::new().count(cards, now)
}

/// Due-queue builder with optional deck scope and size limit.
///
/// ```
/// use brightcards_core::{Card, DeckId, DueQueue};
/// use chrono::Utc;
///
/// let deck = DeckId::new();
/// let now = Utc::now();
/// let cards = vec![Card::new(deck, now), Card::new(DeckId::new(), now)];
///
/// let queue = DueQueue::new().deck(deck).limit(10).build(&cards, now);
/// assert_eq!(queue.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueQueue {
    deck: Option<DeckId>,
    limit: Option<usize>,
}

impl DueQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only include cards from `deck`
    pub fn deck(mut self, deck: DeckId) -> Self {
        self.deck = Some(deck);
        self
    }

    /// Return at most `limit` cards
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn admits(&self, card: &Card, now: DateTime<Utc>) -> bool {
        card.is_due(now) && self.deck.is_none_or(|deck| card.deck_id == deck)
    }

    /// Filter and order `cards` as of `now`
    pub fn build<'a, I>(&self, cards: I, now: DateTime<Utc>) -> Vec<&'a Card>
    where
        I: IntoIterator<Item = &'a Card>,
    {
        let mut due: Vec<&Card> = cards.into_iter().filter(|c| self.admits(c, now)).collect();
        due.sort_by(|a, b| a.due.cmp(&b.due).then_with(|| a.id.cmp(&b.id)));
        if let Some(limit) = self.limit {
            due.truncate(limit);
        }
        due
    }

    /// Number of eligible cards, ignoring the limit
    pub fn count<'a, I>(&self, cards: I, now: DateTime<Utc>) -> usize
    where
        I: IntoIterator<Item = &'a Card>,
    {
        cards.into_iter().filter(|c| self.admits(c, now)).count()
    }
}
