use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use study_core::model::{Card, CardId, Deck, DeckId, UserId, normalize_name};
use thiserror::Error;

use crate::auth::AuthSession;
use crate::config::ApiConfig;
use crate::http::HttpRepository;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not signed in or the session has expired")]
    Unauthenticated,

    #[error("not found")]
    NotFound,

    #[error("rejected by the server: {0}")]
    ValidationRejected(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl StorageError {
    /// Only transport failures are worth retrying unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Transport(_))
    }
}

/// Remote deck operations. No caching and no retries.
#[async_trait]
pub trait DeckRepository: Send + Sync {
    /// List the current user's decks whose name matches `name_filter`.
    /// An empty filter lists every deck.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn list_decks(&self, name_filter: &str) -> Result<Vec<Deck>, StorageError>;

    /// Fetch a deck by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_deck(&self, id: &DeckId) -> Result<Deck, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::ValidationRejected` if the store refuses the name.
    async fn create_deck(&self, name: &str) -> Result<Deck, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the deck is gone, or other storage errors.
    async fn rename_deck(&self, id: &DeckId, name: &str) -> Result<Deck, StorageError>;

    /// Delete a deck. The store removes its cards.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the deck is gone, or other storage errors.
    async fn delete_deck(&self, id: &DeckId) -> Result<(), StorageError>;
}

/// Remote card operations. No caching and no retries.
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// List a deck's cards ordered by `index`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be queried.
    async fn list_cards(&self, deck_id: &DeckId) -> Result<Vec<Card>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the deck is gone, or other storage errors.
    async fn create_card(
        &self,
        deck_id: &DeckId,
        front: &str,
        back: &str,
    ) -> Result<Card, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the card is gone, or other storage errors.
    async fn update_card(&self, id: &CardId, front: &str, back: &str)
    -> Result<Card, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the card is gone, or other storage errors.
    async fn delete_card(&self, id: &CardId) -> Result<(), StorageError>;
}

/// Sort cards into presentation order. Equal indexes keep their given order.
pub fn order_cards(cards: &mut [Card]) {
    cards.sort_by_key(|card| card.index);
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

/// Repository operations, used to inject failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepoOp {
    ListDecks,
    GetDeck,
    CreateDeck,
    RenameDeck,
    DeleteDeck,
    ListCards,
    CreateCard,
    UpdateCard,
    DeleteCard,
}

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    decks: Vec<Deck>,
    cards: Vec<Card>,
    failures: HashMap<RepoOp, VecDeque<StorageError>>,
    calls: HashMap<RepoOp, usize>,
}

impl MemoryState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    /// Counts the call and pops an injected failure, if any.
    fn enter(&mut self, op: RepoOp) -> Result<(), StorageError> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory store for tests and prototyping.
///
/// Behaves like the remote store: ids and card indexes are assigned on
/// create, deck deletion cascades to cards, blank deck names are rejected.
#[derive(Clone)]
pub struct InMemoryRepository {
    owner: UserId,
    state: Arc<Mutex<MemoryState>>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::with_owner(UserId::new("local"))
    }

    #[must_use]
    pub fn with_owner(owner: UserId) -> Self {
        Self {
            owner,
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Transport(e.to_string()))
    }

    /// Make the next call of `op` fail with `err`. Failures queue up per op.
    pub fn fail_next(&self, op: RepoOp, err: StorageError) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.entry(op).or_default().push_back(err);
        }
    }

    /// Number of times `op` has been called.
    #[must_use]
    pub fn calls(&self, op: RepoOp) -> usize {
        self.state
            .lock()
            .map(|state| state.calls.get(&op).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of calls across every operation.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.calls.values().sum())
            .unwrap_or(0)
    }

    /// Insert a deck with cards directly, bypassing call counting.
    ///
    /// # Panics
    ///
    /// Panics on a blank name or a poisoned lock; meant for test setup.
    #[must_use]
    pub fn seed_deck(&self, name: &str, cards: &[(&str, &str)]) -> (Deck, Vec<Card>) {
        let mut state = self.state.lock().expect("in-memory store lock");
        let deck_id = DeckId::new(state.next_id("deck-"));
        let deck = Deck::new(deck_id.clone(), self.owner.clone(), name).expect("seed deck name");
        state.decks.push(deck.clone());

        let mut seeded = Vec::with_capacity(cards.len());
        for (index, (front, back)) in cards.iter().enumerate() {
            let card = Card {
                id: CardId::new(state.next_id("card-")),
                deck_id: deck_id.clone(),
                front: (*front).to_owned(),
                back: (*back).to_owned(),
                index: u32::try_from(index).unwrap_or(u32::MAX),
            };
            state.cards.push(card.clone());
            seeded.push(card);
        }
        (deck, seeded)
    }
}

#[async_trait]
impl DeckRepository for InMemoryRepository {
    async fn list_decks(&self, name_filter: &str) -> Result<Vec<Deck>, StorageError> {
        let mut state = self.lock()?;
        state.enter(RepoOp::ListDecks)?;
        let needle = name_filter.trim().to_lowercase();
        Ok(state
            .decks
            .iter()
            .filter(|deck| deck.owner_id() == &self.owner)
            .filter(|deck| needle.is_empty() || deck.name().to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn get_deck(&self, id: &DeckId) -> Result<Deck, StorageError> {
        let mut state = self.lock()?;
        state.enter(RepoOp::GetDeck)?;
        state
            .decks
            .iter()
            .find(|deck| deck.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn create_deck(&self, name: &str) -> Result<Deck, StorageError> {
        let mut state = self.lock()?;
        state.enter(RepoOp::CreateDeck)?;
        let id = DeckId::new(state.next_id("deck-"));
        let deck = Deck::new(id, self.owner.clone(), name)
            .map_err(|e| StorageError::ValidationRejected(e.to_string()))?;
        state.decks.push(deck.clone());
        Ok(deck)
    }

    async fn rename_deck(&self, id: &DeckId, name: &str) -> Result<Deck, StorageError> {
        let mut state = self.lock()?;
        state.enter(RepoOp::RenameDeck)?;
        let name = normalize_name(name.to_owned())
            .map_err(|e| StorageError::ValidationRejected(e.to_string()))?;
        let slot = state
            .decks
            .iter_mut()
            .find(|deck| deck.id() == id)
            .ok_or(StorageError::NotFound)?;
        let renamed = Deck::new(slot.id().clone(), slot.owner_id().clone(), name)
            .map_err(|e| StorageError::ValidationRejected(e.to_string()))?;
        *slot = renamed.clone();
        Ok(renamed)
    }

    async fn delete_deck(&self, id: &DeckId) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.enter(RepoOp::DeleteDeck)?;
        let before = state.decks.len();
        state.decks.retain(|deck| deck.id() != id);
        if state.decks.len() == before {
            return Err(StorageError::NotFound);
        }
        state.cards.retain(|card| &card.deck_id != id);
        Ok(())
    }
}

#[async_trait]
impl CardRepository for InMemoryRepository {
    async fn list_cards(&self, deck_id: &DeckId) -> Result<Vec<Card>, StorageError> {
        let mut state = self.lock()?;
        state.enter(RepoOp::ListCards)?;
        if !state.decks.iter().any(|deck| deck.id() == deck_id) {
            return Err(StorageError::NotFound);
        }
        let mut cards: Vec<Card> = state
            .cards
            .iter()
            .filter(|card| &card.deck_id == deck_id)
            .cloned()
            .collect();
        order_cards(&mut cards);
        Ok(cards)
    }

    async fn create_card(
        &self,
        deck_id: &DeckId,
        front: &str,
        back: &str,
    ) -> Result<Card, StorageError> {
        let mut state = self.lock()?;
        state.enter(RepoOp::CreateCard)?;
        if !state.decks.iter().any(|deck| deck.id() == deck_id) {
            return Err(StorageError::NotFound);
        }
        let index = state
            .cards
            .iter()
            .filter(|card| &card.deck_id == deck_id)
            .map(|card| card.index + 1)
            .max()
            .unwrap_or(0);
        let card = Card {
            id: CardId::new(state.next_id("card-")),
            deck_id: deck_id.clone(),
            front: front.to_owned(),
            back: back.to_owned(),
            index,
        };
        state.cards.push(card.clone());
        Ok(card)
    }

    async fn update_card(
        &self,
        id: &CardId,
        front: &str,
        back: &str,
    ) -> Result<Card, StorageError> {
        let mut state = self.lock()?;
        state.enter(RepoOp::UpdateCard)?;
        let card = state
            .cards
            .iter_mut()
            .find(|card| &card.id == id)
            .ok_or(StorageError::NotFound)?;
        front.clone_into(&mut card.front);
        back.clone_into(&mut card.back);
        Ok(card.clone())
    }

    async fn delete_card(&self, id: &CardId) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.enter(RepoOp::DeleteCard)?;
        let before = state.cards.len();
        state.cards.retain(|card| &card.id != id);
        if state.cards.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Aggregates deck and card repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub decks: Arc<dyn DeckRepository>,
    pub cards: Arc<dyn CardRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let decks: Arc<dyn DeckRepository> = Arc::new(repo.clone());
        let cards: Arc<dyn CardRepository> = Arc::new(repo);
        Self { decks, cards }
    }

    /// Build a `Storage` backed by the remote HTTP store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Transport` if the HTTP client cannot be built.
    pub fn http(config: ApiConfig, auth: Arc<AuthSession>) -> Result<Self, StorageError> {
        let repo = HttpRepository::new(config, auth)?;
        let decks: Arc<dyn DeckRepository> = Arc::new(repo.clone());
        let cards: Arc<dyn CardRepository> = Arc::new(repo);
        Ok(Self { decks, cards })
    }
}
