use thiserror::Error;

use crate::model::ids::{DeckId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeckError {
    #[error("deck name cannot be empty")]
    EmptyName,
}

//
// ─── DECK ──────────────────────────────────────────────────────────────────────
//

/// A named collection of cards owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    id: DeckId,
    owner_id: UserId,
    name: String,
}

impl Deck {
    /// Creates a new Deck.
    ///
    /// # Errors
    ///
    /// Returns `DeckError::EmptyName` if name is empty or whitespace-only.
    pub fn new(id: DeckId, owner_id: UserId, name: impl Into<String>) -> Result<Self, DeckError> {
        let name = normalize_name(name.into())?;
        Ok(Self { id, owner_id, name })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &DeckId {
        &self.id
    }

    #[must_use]
    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Trims a deck name, rejecting blank input.
///
/// # Errors
///
/// Returns `DeckError::EmptyName` if nothing but whitespace remains.
pub fn normalize_name(name: String) -> Result<String, DeckError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DeckError::EmptyName);
    }
    if trimmed.len() == name.len() {
        Ok(name)
    } else {
        Ok(trimmed.to_owned())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deck_new_rejects_empty_name() {
        let err = Deck::new(DeckId::new("d1"), UserId::new("u1"), "   ").unwrap_err();
        assert_eq!(err, DeckError::EmptyName);
    }

    #[test]
    fn deck_new_trims_name() {
        let deck = Deck::new(DeckId::new("d1"), UserId::new("u1"), "  Biology ").unwrap();
        assert_eq!(deck.name(), "Biology");
        assert_eq!(deck.owner_id(), &UserId::new("u1"));
    }
}
