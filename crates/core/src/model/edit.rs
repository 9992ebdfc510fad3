use crate::error::ValidationError;
use crate::model::card::{Card, CardFace, is_filled};
use crate::model::deck::Deck;
use crate::model::ids::{CardId, DeckId, UserId};

/// Fewest cards a deck may be left with in the editor.
pub const MIN_CARDS: usize = 2;

//
// ─── FIELD ─────────────────────────────────────────────────────────────────────
//

/// A single independently committed value.
///
/// `local` is what the user sees, `committed` the last value the store
/// confirmed, `in_flight` the value of an outstanding commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableField {
    local: String,
    committed: String,
    in_flight: Option<String>,
    revision: u64,
}

impl EditableField {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            local: value.clone(),
            committed: value,
            in_flight: None,
            revision: 0,
        }
    }

    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }

    #[must_use]
    pub fn committed(&self) -> &str {
        &self.committed
    }

    #[must_use]
    pub fn in_flight(&self) -> Option<&str> {
        self.in_flight.as_deref()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Bumped each time a commit of this field begins.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.local != self.committed
    }

    /// Value the store will hold once outstanding commits land.
    #[must_use]
    pub fn expected_remote(&self) -> &str {
        self.in_flight.as_deref().unwrap_or(&self.committed)
    }

    pub fn set_local(&mut self, value: impl Into<String>) {
        self.local = value.into();
    }

    /// Marks the local value as pending and returns it.
    ///
    /// Returns `None` when there is nothing new to send.
    pub fn begin_commit(&mut self) -> Option<String> {
        if self.in_flight.as_deref() == Some(self.local.as_str()) {
            return None;
        }
        if self.in_flight.is_none() && !self.is_dirty() {
            return None;
        }
        self.in_flight = Some(self.local.clone());
        self.revision += 1;
        Some(self.local.clone())
    }

    /// Records the store's confirmation of `sent`.
    pub fn confirm(&mut self, sent: &str, stored: impl Into<String>) {
        let stored = stored.into();
        if self.local == sent {
            self.local.clone_from(&stored);
        }
        self.committed = stored;
        if self.in_flight.as_deref() == Some(sent) {
            self.in_flight = None;
        }
    }

    /// Drops a failed commit of `sent`, restoring the last known-good value.
    ///
    /// Returns false when a newer commit has superseded `sent`; the field is
    /// left alone in that case.
    pub fn reject(&mut self, sent: &str) -> bool {
        if self.in_flight.as_deref() != Some(sent) {
            return false;
        }
        self.in_flight = None;
        self.local.clone_from(&self.committed);
        true
    }

    /// Adopts `stored` as the known-good value after a commit of another
    /// field wrote it. An unedited, settled local value follows along.
    pub fn sync_committed(&mut self, stored: impl Into<String>) {
        let stored = stored.into();
        if self.in_flight.is_none() && !self.is_dirty() {
            self.local.clone_from(&stored);
        }
        self.committed = stored;
    }
}

//
// ─── CARD ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableCard {
    id: CardId,
    deck_id: DeckId,
    index: u32,
    front: EditableField,
    back: EditableField,
}

impl EditableCard {
    #[must_use]
    pub fn from_card(card: Card) -> Self {
        Self {
            id: card.id,
            deck_id: card.deck_id,
            index: card.index,
            front: EditableField::new(card.front),
            back: EditableField::new(card.back),
        }
    }

    #[must_use]
    pub fn id(&self) -> &CardId {
        &self.id
    }

    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[must_use]
    pub fn field(&self, face: CardFace) -> &EditableField {
        match face {
            CardFace::Front => &self.front,
            CardFace::Back => &self.back,
        }
    }

    pub fn field_mut(&mut self, face: CardFace) -> &mut EditableField {
        match face {
            CardFace::Front => &mut self.front,
            CardFace::Back => &mut self.back,
        }
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        is_filled(self.front.local()) && is_filled(self.back.local())
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.front.is_pending() || self.back.is_pending()
    }

    /// The card as currently displayed.
    #[must_use]
    pub fn to_card(&self) -> Card {
        Card {
            id: self.id.clone(),
            deck_id: self.deck_id.clone(),
            front: self.front.local().to_owned(),
            back: self.back.local().to_owned(),
            index: self.index,
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Editable view of a deck's name and cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    deck_id: DeckId,
    owner_id: UserId,
    name: EditableField,
    cards: Vec<EditableCard>,
}

impl EditSession {
    #[must_use]
    pub fn new(deck: Deck, mut cards: Vec<Card>) -> Self {
        cards.sort_by_key(|card| card.index);
        Self {
            deck_id: deck.id().clone(),
            owner_id: deck.owner_id().clone(),
            name: EditableField::new(deck.name()),
            cards: cards.into_iter().map(EditableCard::from_card).collect(),
        }
    }

    #[must_use]
    pub fn deck_id(&self) -> &DeckId {
        &self.deck_id
    }

    #[must_use]
    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    #[must_use]
    pub fn name(&self) -> &EditableField {
        &self.name
    }

    pub fn name_mut(&mut self) -> &mut EditableField {
        &mut self.name
    }

    #[must_use]
    pub fn cards(&self) -> &[EditableCard] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn card(&self, id: &CardId) -> Option<&EditableCard> {
        self.cards.iter().find(|card| card.id() == id)
    }

    pub fn card_mut(&mut self, id: &CardId) -> Option<&mut EditableCard> {
        self.cards.iter_mut().find(|card| card.id() == id)
    }

    /// Appends a card the store has already created.
    pub fn push_card(&mut self, card: Card) {
        self.cards.push(EditableCard::from_card(card));
    }

    pub fn remove_card(&mut self, id: &CardId) -> Option<EditableCard> {
        let pos = self.cards.iter().position(|card| card.id() == id)?;
        Some(self.cards.remove(pos))
    }

    /// # Errors
    ///
    /// Returns `ValidationError::MinimumCards` when a delete would leave
    /// fewer than two cards.
    pub fn ensure_can_delete(&self) -> Result<(), ValidationError> {
        if self.cards.len() <= MIN_CARDS {
            return Err(ValidationError::MinimumCards);
        }
        Ok(())
    }

    #[must_use]
    pub fn can_exit(&self) -> bool {
        is_filled(self.name.local())
            && self.cards.len() >= MIN_CARDS
            && self.cards.iter().all(EditableCard::is_filled)
    }

    #[must_use]
    pub fn has_pending_commits(&self) -> bool {
        self.name.is_pending() || self.cards.iter().any(EditableCard::is_pending)
    }
}
