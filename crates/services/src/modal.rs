//! Dashboard modal forms and their local validation.

use study_core::ValidationError;
use study_core::model::{Card, CardDraft, CardId, Deck, DeckId, normalize_name};

/// Rows a fresh create-deck form starts with.
const INITIAL_ROWS: usize = 2;

fn required_name(name: &str) -> Result<String, ValidationError> {
    normalize_name(name.to_owned()).map_err(|_| ValidationError::NameRequired)
}

/// New deck with its first cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDeckForm {
    pub name: String,
    pub cards: Vec<CardDraft>,
}

impl Default for CreateDeckForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            cards: vec![CardDraft::default(); INITIAL_ROWS],
        }
    }
}

impl CreateDeckForm {
    pub fn add_row(&mut self) {
        self.cards.push(CardDraft::default());
    }

    pub fn remove_row(&mut self, row: usize) -> Option<CardDraft> {
        (row < self.cards.len()).then(|| self.cards.remove(row))
    }

    /// Trimmed name and the rows with both faces filled, in order.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NameRequired` for a blank name, or
    /// `ValidationError::NotEnoughFilledCards` with fewer than two filled rows.
    pub fn validate(&self) -> Result<(String, Vec<CardDraft>), ValidationError> {
        let name = required_name(&self.name)?;
        let cards: Vec<CardDraft> = self
            .cards
            .iter()
            .filter(|draft| draft.is_filled())
            .cloned()
            .collect();
        if cards.len() < 2 {
            return Err(ValidationError::NotEnoughFilledCards);
        }
        Ok((name, cards))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameDeckForm {
    pub deck_id: DeckId,
    pub name: String,
}

impl RenameDeckForm {
    #[must_use]
    pub fn for_deck(deck: &Deck) -> Self {
        Self {
            deck_id: deck.id().clone(),
            name: deck.name().to_owned(),
        }
    }

    /// # Errors
    ///
    /// Returns `ValidationError::NameRequired` for a blank name.
    pub fn validate(&self) -> Result<String, ValidationError> {
        required_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCardForm {
    pub deck_id: DeckId,
    pub draft: CardDraft,
}

impl AddCardForm {
    #[must_use]
    pub fn new(deck_id: DeckId) -> Self {
        Self {
            deck_id,
            draft: CardDraft::default(),
        }
    }

    /// # Errors
    ///
    /// Returns `ValidationError::EmptyFace` unless both faces hold text.
    pub fn validate(&self) -> Result<CardDraft, ValidationError> {
        self.draft.clone().validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCardForm {
    pub card_id: CardId,
    pub draft: CardDraft,
}

impl EditCardForm {
    #[must_use]
    pub fn for_card(card: &Card) -> Self {
        Self {
            card_id: card.id.clone(),
            draft: CardDraft::new(card.front.clone(), card.back.clone()),
        }
    }

    /// # Errors
    ///
    /// Returns `ValidationError::EmptyFace` unless both faces hold text.
    pub fn validate(&self) -> Result<CardDraft, ValidationError> {
        self.draft.clone().validate()
    }
}

/// The dashboard's single open modal, tagged by purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalIntent {
    CreateDeck(CreateDeckForm),
    RenameDeck(RenameDeckForm),
    AddCard(AddCardForm),
    EditCard(EditCardForm),
}

/// What a submitted modal stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalOutcome {
    DeckCreated { deck: Deck, cards: Vec<Card> },
    DeckRenamed(Deck),
    CardAdded(Card),
    CardUpdated(Card),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_form_starts_with_two_blank_rows() {
        let form = CreateDeckForm::default();
        assert_eq!(form.cards.len(), 2);
        assert!(form.cards.iter().all(CardDraft::is_blank));
    }

    #[test]
    fn create_form_keeps_only_filled_rows() {
        let mut form = CreateDeckForm {
            name: "  Biology ".into(),
            ..CreateDeckForm::default()
        };
        form.cards[0] = CardDraft::new("mitosis", "cell division");
        form.add_row();
        form.cards[2] = CardDraft::new("DNA", "genetic material");
        form.add_row();
        form.cards[3] = CardDraft::new("half", "");

        let (name, cards) = form.validate().unwrap();
        assert_eq!(name, "Biology");
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].front, "DNA");
    }

    #[test]
    fn create_form_needs_two_filled_rows() {
        let mut form = CreateDeckForm {
            name: "Biology".into(),
            ..CreateDeckForm::default()
        };
        form.cards[0] = CardDraft::new("mitosis", "cell division");
        assert_eq!(form.validate(), Err(ValidationError::NotEnoughFilledCards));

        form.name = " ".into();
        assert_eq!(form.validate(), Err(ValidationError::NameRequired));
    }

    #[test]
    fn remove_row_out_of_range_is_none() {
        let mut form = CreateDeckForm::default();
        assert!(form.remove_row(5).is_none());
        assert!(form.remove_row(1).is_some());
        assert_eq!(form.cards.len(), 1);
    }

    #[test]
    fn card_forms_require_both_faces() {
        let mut form = AddCardForm::new(DeckId::new("d1"));
        form.draft.front = "front".into();
        assert_eq!(form.validate(), Err(ValidationError::EmptyFace));
        form.draft.back = "back".into();
        assert!(form.validate().is_ok());
    }
}
