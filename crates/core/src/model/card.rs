use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::ids::{CardId, DeckId};

//
// ─── CARD TYPES ────────────────────────────────────────────────────────────────
//

/// A front/back content unit; `index` orders cards within their deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub deck_id: DeckId,
    pub front: String,
    pub back: String,
    pub index: u32,
}

impl Card {
    #[must_use]
    pub fn face(&self, face: CardFace) -> &str {
        match face {
            CardFace::Front => &self.front,
            CardFace::Back => &self.back,
        }
    }

    pub fn set_face(&mut self, face: CardFace, value: impl Into<String>) {
        match face {
            CardFace::Front => self.front = value.into(),
            CardFace::Back => self.back = value.into(),
        }
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        is_filled(&self.front) && is_filled(&self.back)
    }
}

/// One side of a card. Also names the editable card fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardFace {
    Front,
    Back,
}

impl CardFace {
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            CardFace::Front => CardFace::Back,
            CardFace::Back => CardFace::Front,
        }
    }
}

impl fmt::Display for CardFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardFace::Front => f.write_str("front"),
            CardFace::Back => f.write_str("back"),
        }
    }
}

/// Card content that has not been stored yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDraft {
    pub front: String,
    pub back: String,
}

impl CardDraft {
    #[must_use]
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        is_filled(&self.front) && is_filled(&self.back)
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        !is_filled(&self.front) && !is_filled(&self.back)
    }

    /// # Errors
    ///
    /// Returns `ValidationError::EmptyFace` unless both faces hold text.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.is_filled() {
            Ok(self)
        } else {
            Err(ValidationError::EmptyFace)
        }
    }
}

pub(crate) fn is_filled(text: &str) -> bool {
    !text.trim().is_empty()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
