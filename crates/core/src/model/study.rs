use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::card::{Card, CardFace};
use crate::model::deck::Deck;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudySessionError {
    #[error("deck has no cards to study")]
    NoCards,
}

/// Whether the walk still has cards ahead of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    Reviewing,
    Exhausted,
}

/// Outcome of stepping forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Advanced,
    Exhausted,
}

/// An ordered walk over a snapshot of a deck's cards.
///
/// The snapshot is taken once; later edits to the deck do not affect it.
/// `position` always indexes an existing card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySession {
    deck: Deck,
    cards: Vec<Card>,
    position: usize,
    orientation: CardFace,
    status: WalkStatus,
    started_at: DateTime<Utc>,
}

impl StudySession {
    /// Starts a walk at the first card, front side up.
    ///
    /// Cards are ordered by `index`; equal indexes keep their given order.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionError::NoCards` when `cards` is empty.
    pub fn new(
        deck: Deck,
        mut cards: Vec<Card>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, StudySessionError> {
        if cards.is_empty() {
            return Err(StudySessionError::NoCards);
        }
        cards.sort_by_key(|card| card.index);

        Ok(Self {
            deck,
            cards,
            position: 0,
            orientation: CardFace::Front,
            status: WalkStatus::Reviewing,
            started_at,
        })
    }

    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn orientation(&self) -> CardFace {
        self.orientation
    }

    #[must_use]
    pub fn status(&self) -> WalkStatus {
        self.status
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Always false; a session cannot be built without cards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn current_card(&self) -> &Card {
        &self.cards[self.position]
    }

    /// Text on the face currently shown.
    #[must_use]
    pub fn displayed_text(&self) -> &str {
        self.current_card().face(self.orientation)
    }

    /// One-based position and total, e.g. `(2, 10)`.
    #[must_use]
    pub fn progress(&self) -> (usize, usize) {
        (self.position + 1, self.cards.len())
    }

    pub fn flip(&mut self) {
        self.orientation = self.orientation.flipped();
    }

    /// Moves to the next card, or marks the walk exhausted on the last one.
    pub fn next(&mut self) -> Step {
        if self.position + 1 < self.cards.len() {
            self.position += 1;
            self.orientation = CardFace::Front;
            Step::Advanced
        } else {
            self.status = WalkStatus::Exhausted;
            Step::Exhausted
        }
    }

    /// Moves back one card. Returns false at the first card.
    pub fn previous(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.position -= 1;
        self.orientation = CardFace::Front;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CardId, DeckId, UserId};
    use crate::time::fixed_now;

    fn biology() -> (Deck, Vec<Card>) {
        let deck_id = DeckId::new("bio");
        let deck = Deck::new(deck_id.clone(), UserId::new("u1"), "Biology").unwrap();
        let cards = vec![
            Card {
                id: CardId::new("c2"),
                deck_id: deck_id.clone(),
                front: "DNA".into(),
                back: "genetic material".into(),
                index: 1,
            },
            Card {
                id: CardId::new("c1"),
                deck_id,
                front: "mitosis".into(),
                back: "cell division".into(),
                index: 0,
            },
        ];
        (deck, cards)
    }

    #[test]
    fn empty_deck_cannot_start() {
        let (deck, _) = biology();
        let err = StudySession::new(deck, Vec::new(), fixed_now()).unwrap_err();
        assert_eq!(err, StudySessionError::NoCards);
    }

    #[test]
    fn walk_follows_card_index() {
        let (deck, cards) = biology();
        let mut session = StudySession::new(deck, cards, fixed_now()).unwrap();
        assert_eq!(session.displayed_text(), "mitosis");
        session.flip();
        assert_eq!(session.displayed_text(), "cell division");
        assert_eq!(session.next(), Step::Advanced);
        assert_eq!(session.displayed_text(), "DNA");
        assert_eq!(session.progress(), (2, 2));
    }

    #[test]
    fn next_on_last_card_exhausts_without_moving() {
        let (deck, cards) = biology();
        let mut session = StudySession::new(deck, cards, fixed_now()).unwrap();
        session.next();
        for _ in 0..3 {
            assert_eq!(session.next(), Step::Exhausted);
            assert_eq!(session.position(), 1);
        }
        assert_eq!(session.status(), WalkStatus::Exhausted);
    }

    #[test]
    fn previous_at_start_is_noop() {
        let (deck, cards) = biology();
        let mut session = StudySession::new(deck, cards, fixed_now()).unwrap();
        assert!(!session.previous());
        assert_eq!(session.position(), 0);
    }
}
