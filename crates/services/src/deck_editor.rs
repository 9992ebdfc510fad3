use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use storage::{CardRepository, DeckRepository, StorageError};
use study_core::ValidationError;
use study_core::model::{Card, CardDraft, CardFace, CardId, DeckId, EditSession, EditableField};

use crate::error::EditorError;
use crate::route::Route;

/// Identifies one independently committed field of the editor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Name,
    Card(CardId, CardFace),
}

#[derive(Debug, Clone)]
enum CommitTarget {
    Name {
        deck_id: DeckId,
        name: String,
    },
    Card {
        card_id: CardId,
        face: CardFace,
        front: String,
        back: String,
        sibling_revision: u64,
    },
}

/// A prepared commit for one field.
///
/// Holds its own repository handles so several commits can be awaited at
/// once while the controller keeps taking edits.
pub struct FieldCommit {
    key: FieldKey,
    sent: String,
    target: CommitTarget,
    decks: Arc<dyn DeckRepository>,
    cards: Arc<dyn CardRepository>,
}

impl FieldCommit {
    #[must_use]
    pub fn key(&self) -> &FieldKey {
        &self.key
    }

    /// The value this commit stores.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.sent
    }

    pub async fn send(self) -> CommitOutcome {
        let mut stored_card = None;
        let sibling_revision = match &self.target {
            CommitTarget::Card {
                sibling_revision, ..
            } => *sibling_revision,
            CommitTarget::Name { .. } => 0,
        };
        let result = match &self.target {
            CommitTarget::Name { deck_id, name } => self
                .decks
                .rename_deck(deck_id, name)
                .await
                .map(|deck| deck.name().to_owned()),
            CommitTarget::Card {
                card_id,
                face,
                front,
                back,
                ..
            } => self
                .cards
                .update_card(card_id, front, back)
                .await
                .map(|card| {
                    let value = card.face(*face).to_owned();
                    stored_card = Some(card);
                    value
                }),
        };
        CommitOutcome {
            key: self.key,
            sent: self.sent,
            result,
            stored_card,
            sibling_revision,
        }
    }
}

/// What the store answered for a `FieldCommit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    key: FieldKey,
    sent: String,
    result: Result<String, StorageError>,
    stored_card: Option<Card>,
    sibling_revision: u64,
}

impl CommitOutcome {
    #[must_use]
    pub fn key(&self) -> &FieldKey {
        &self.key
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// The whole card as stored, for a successful card commit.
    #[must_use]
    pub fn stored_card(&self) -> Option<&Card> {
        self.stored_card.as_ref()
    }
}

/// Editor page state: the deck name and each card face commit on their own.
pub struct DeckEditorController {
    decks: Arc<dyn DeckRepository>,
    cards: Arc<dyn CardRepository>,
    session: Option<EditSession>,
    page_error: Option<EditorError>,
    field_errors: HashMap<FieldKey, EditorError>,
    last_error: Option<EditorError>,
}

impl DeckEditorController {
    #[must_use]
    pub fn new(decks: Arc<dyn DeckRepository>, cards: Arc<dyn CardRepository>) -> Self {
        Self {
            decks,
            cards,
            session: None,
            page_error: None,
            field_errors: HashMap::new(),
            last_error: None,
        }
    }

    /// Fetch the deck and its ordered cards.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::Storage` when either fetch fails; the error is
    /// also kept as the page error.
    pub async fn load(&mut self, deck_id: &DeckId) -> Result<(), EditorError> {
        self.session = None;
        self.field_errors.clear();
        self.last_error = None;

        let fetched = async {
            let deck = self.decks.get_deck(deck_id).await?;
            let cards = self.cards.list_cards(deck_id).await?;
            Ok::<_, StorageError>(EditSession::new(deck, cards))
        }
        .await;

        match fetched {
            Ok(session) => {
                debug!("editor loaded deck {deck_id} with {} cards", session.len());
                self.session = Some(session);
                self.page_error = None;
                Ok(())
            }
            Err(err) => {
                warn!("editor failed to load deck {deck_id}: {err}");
                let err = EditorError::from(err);
                self.page_error = Some(err.clone());
                Err(err)
            }
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    /// Local edit of the name field. Nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::NotLoaded` before a deck is loaded.
    pub fn set_name(&mut self, value: impl Into<String>) -> Result<(), EditorError> {
        self.loaded_mut()?.name_mut().set_local(value);
        Ok(())
    }

    /// Local edit of one card face. Nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::UnknownCard` if the card is not in the deck.
    pub fn edit_card(
        &mut self,
        id: &CardId,
        face: CardFace,
        value: impl Into<String>,
    ) -> Result<(), EditorError> {
        self.field_mut(&FieldKey::Card(id.clone(), face))?
            .set_local(value);
        Ok(())
    }

    /// Mark a field pending and capture the request that stores it.
    ///
    /// Returns `None` when the field holds nothing new.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NameRequired` for a blank name, or
    /// `EditorError::UnknownCard` / `EditorError::NotLoaded`.
    pub fn prepare_commit(&mut self, key: FieldKey) -> Result<Option<FieldCommit>, EditorError> {
        let session = self
            .session
            .as_mut()
            .ok_or(EditorError::NotLoaded)?;

        let (sent, target) = match &key {
            FieldKey::Name => {
                if session.name().local().trim().is_empty() {
                    let err = EditorError::from(ValidationError::NameRequired);
                    self.field_errors.insert(FieldKey::Name, err.clone());
                    self.last_error = Some(err.clone());
                    return Err(err);
                }
                let deck_id = session.deck_id().clone();
                let Some(sent) = session.name_mut().begin_commit() else {
                    return Ok(None);
                };
                let target = CommitTarget::Name {
                    deck_id,
                    name: sent.clone(),
                };
                (sent, target)
            }
            FieldKey::Card(card_id, face) => {
                let card = session
                    .card_mut(card_id)
                    .ok_or_else(|| EditorError::UnknownCard(card_id.clone()))?;
                let Some(sent) = card.field_mut(*face).begin_commit() else {
                    return Ok(None);
                };
                let sibling_field = card.field(face.flipped());
                let sibling_revision = sibling_field.revision();
                let sibling = sibling_field.expected_remote().to_owned();
                let (front, back) = match face {
                    CardFace::Front => (sent.clone(), sibling),
                    CardFace::Back => (sibling, sent.clone()),
                };
                let target = CommitTarget::Card {
                    card_id: card_id.clone(),
                    face: *face,
                    front,
                    back,
                    sibling_revision,
                };
                (sent, target)
            }
        };

        debug!("committing {key:?}");
        Ok(Some(FieldCommit {
            key,
            sent,
            target,
            decks: Arc::clone(&self.decks),
            cards: Arc::clone(&self.cards),
        }))
    }

    /// Settle a field with the store's answer.
    ///
    /// Outcomes for cards removed in the meantime are dropped. A failure
    /// reverts only the committed field, unless a newer commit replaced it.
    ///
    /// # Errors
    ///
    /// Returns the store's error for a failed commit.
    pub fn apply_commit(&mut self, outcome: CommitOutcome) -> Result<(), EditorError> {
        let CommitOutcome {
            key,
            sent,
            result,
            stored_card,
            sibling_revision,
        } = outcome;
        if self.field_mut(&key).is_err() {
            debug!("dropping commit outcome for {key:?}: field is gone");
            return Ok(());
        }

        // A card update also wrote the sibling face. Unless a newer commit of
        // that face was prepared since, adopt what the store holds before the
        // face settles its own commit.
        if let (FieldKey::Card(id, face), Some(card)) = (&key, &stored_card) {
            let sibling = face.flipped();
            if let Ok(field) = self.field_mut(&FieldKey::Card(id.clone(), sibling))
                && field.revision() == sibling_revision
            {
                field.sync_committed(card.face(sibling));
            }
        }

        let field = self.field_mut(&key)?;
        match result {
            Ok(stored) => {
                field.confirm(&sent, stored);
                self.field_errors.remove(&key);
                Ok(())
            }
            Err(err) => {
                let reverted = field.reject(&sent);
                warn!("commit of {key:?} failed (reverted: {reverted}): {err}");
                let err = EditorError::from(err);
                self.field_errors.insert(key, err.clone());
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Prepare, send and apply one field commit.
    ///
    /// # Errors
    ///
    /// See `prepare_commit` and `apply_commit`.
    pub async fn commit_field(&mut self, key: FieldKey) -> Result<(), EditorError> {
        match self.prepare_commit(key)? {
            Some(commit) => {
                let outcome = commit.send().await;
                self.apply_commit(outcome)
            }
            None => Ok(()),
        }
    }

    /// Commit a card face once its edit completes.
    ///
    /// # Errors
    ///
    /// See `commit_field`.
    pub async fn commit_card(&mut self, id: &CardId, face: CardFace) -> Result<(), EditorError> {
        self.commit_field(FieldKey::Card(id.clone(), face)).await
    }

    /// Set and commit the deck name.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NameRequired` for a blank name without
    /// contacting the store, or the store's error.
    pub async fn rename_deck(&mut self, name: impl Into<String>) -> Result<(), EditorError> {
        self.set_name(name)?;
        self.commit_field(FieldKey::Name).await
    }

    /// Create a blank card remotely and append it on success.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the card list is unchanged then.
    pub async fn add_card(&mut self) -> Result<CardId, EditorError> {
        self.add_card_with(CardDraft::default()).await
    }

    /// # Errors
    ///
    /// Returns the store's error; the card list is unchanged then.
    pub async fn add_card_with(&mut self, draft: CardDraft) -> Result<CardId, EditorError> {
        let deck_id = self.loaded()?.deck_id().clone();
        match self.cards.create_card(&deck_id, &draft.front, &draft.back).await {
            Ok(card) => {
                let id = card.id.clone();
                debug!("card {id} added to deck {deck_id}");
                self.loaded_mut()?.push_card(card);
                Ok(id)
            }
            Err(err) => Err(self.record(err.into())),
        }
    }

    /// Delete a card remotely, then drop it locally.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MinimumCards` without contacting the store
    /// when two or fewer cards remain, `EditorError::UnknownCard`, or the
    /// store's error.
    pub async fn delete_card(&mut self, id: &CardId) -> Result<(), EditorError> {
        let session = self.loaded()?;
        if let Err(err) = session.ensure_can_delete() {
            return Err(self.record(err.into()));
        }
        if session.card(id).is_none() {
            return Err(self.record(EditorError::UnknownCard(id.clone())));
        }

        match self.cards.delete_card(id).await {
            Ok(()) => {
                self.loaded_mut()?.remove_card(id);
                self.field_errors.retain(|key, _| match key {
                    FieldKey::Card(card_id, _) => card_id != id,
                    FieldKey::Name => true,
                });
                debug!("card {id} deleted");
                Ok(())
            }
            Err(err) => Err(self.record(err.into())),
        }
    }

    /// Named deck with at least two cards, every face filled.
    #[must_use]
    pub fn can_exit(&self) -> bool {
        self.session.as_ref().is_some_and(EditSession::can_exit)
    }

    /// # Errors
    ///
    /// Returns `ValidationError::IncompleteDeck` while `can_exit` is false.
    pub fn exit(&mut self) -> Result<Route, EditorError> {
        if self.can_exit() {
            Ok(Route::Dashboard)
        } else {
            Err(self.record(ValidationError::IncompleteDeck.into()))
        }
    }

    #[must_use]
    pub fn has_pending_commits(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(EditSession::has_pending_commits)
    }

    #[must_use]
    pub fn page_error(&self) -> Option<&EditorError> {
        self.page_error.as_ref()
    }

    #[must_use]
    pub fn field_error(&self, key: &FieldKey) -> Option<&EditorError> {
        self.field_errors.get(key)
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&EditorError> {
        self.last_error.as_ref()
    }

    fn record(&mut self, err: EditorError) -> EditorError {
        warn!("editor: {err}");
        self.last_error = Some(err.clone());
        err
    }

    fn loaded(&self) -> Result<&EditSession, EditorError> {
        self.session.as_ref().ok_or(EditorError::NotLoaded)
    }

    fn loaded_mut(&mut self) -> Result<&mut EditSession, EditorError> {
        self.session.as_mut().ok_or(EditorError::NotLoaded)
    }

    fn field_mut(&mut self, key: &FieldKey) -> Result<&mut EditableField, EditorError> {
        let session = self.loaded_mut()?;
        match key {
            FieldKey::Name => Ok(session.name_mut()),
            FieldKey::Card(id, face) => session
                .card_mut(id)
                .map(|card| card.field_mut(*face))
                .ok_or_else(|| EditorError::UnknownCard(id.clone())),
        }
    }
}
