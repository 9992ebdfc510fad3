use std::sync::Arc;

use log::{debug, warn};
use storage::{CardRepository, DeckRepository, StorageError};
use study_core::model::{Card, Deck, DeckId};

use crate::error::{DashboardError, ErrorKind};
use crate::modal::{
    AddCardForm, CreateDeckForm, EditCardForm, ModalIntent, ModalOutcome, RenameDeckForm,
};
use crate::route::Route;

/// Deck list, search box and modal of the dashboard page.
///
/// Filtering is done by the store; the list only changes on confirmed
/// responses.
pub struct DashboardController {
    decks_repo: Arc<dyn DeckRepository>,
    cards_repo: Arc<dyn CardRepository>,
    search: String,
    submitted: String,
    decks: Vec<Deck>,
    modal: Option<ModalIntent>,
    error: Option<DashboardError>,
}

impl DashboardController {
    #[must_use]
    pub fn new(decks: Arc<dyn DeckRepository>, cards: Arc<dyn CardRepository>) -> Self {
        Self {
            decks_repo: decks,
            cards_repo: cards,
            search: String::new(),
            submitted: String::new(),
            decks: Vec::new(),
            modal: None,
            error: None,
        }
    }

    /// Local edit of the search box.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search
    }

    /// Submit the search box as the deck filter.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the list keeps its previous contents.
    pub async fn search(&mut self) -> Result<(), DashboardError> {
        self.submitted.clone_from(&self.search);
        self.refresh().await
    }

    /// Re-run the last submitted filter.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the list keeps its previous contents.
    pub async fn refresh(&mut self) -> Result<(), DashboardError> {
        match self.decks_repo.list_decks(&self.submitted).await {
            Ok(decks) => {
                debug!("dashboard lists {} decks for {:?}", decks.len(), self.submitted);
                self.decks = decks;
                self.error = None;
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    #[must_use]
    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn open_create(&mut self) {
        self.modal = Some(ModalIntent::CreateDeck(CreateDeckForm::default()));
    }

    /// # Errors
    ///
    /// Returns `DashboardError::UnknownDeck` if the deck is not listed.
    pub fn open_rename(&mut self, deck_id: &DeckId) -> Result<(), DashboardError> {
        let deck = self.listed(deck_id)?;
        self.modal = Some(ModalIntent::RenameDeck(RenameDeckForm::for_deck(deck)));
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DashboardError::UnknownDeck` if the deck is not listed.
    pub fn open_add_card(&mut self, deck_id: &DeckId) -> Result<(), DashboardError> {
        self.listed(deck_id)?;
        self.modal = Some(ModalIntent::AddCard(AddCardForm::new(deck_id.clone())));
        Ok(())
    }

    pub fn open_edit_card(&mut self, card: &Card) {
        self.modal = Some(ModalIntent::EditCard(EditCardForm::for_card(card)));
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    #[must_use]
    pub fn modal(&self) -> Option<&ModalIntent> {
        self.modal.as_ref()
    }

    pub fn modal_mut(&mut self) -> Option<&mut ModalIntent> {
        self.modal.as_mut()
    }

    /// Submit the open modal. It closes unless local validation failed.
    ///
    /// Returns `None` when no modal is open.
    ///
    /// # Errors
    ///
    /// See `submit`.
    pub async fn submit_modal(&mut self) -> Option<Result<ModalOutcome, DashboardError>> {
        let intent = self.modal.take()?;
        let result = self.submit(intent.clone()).await;
        if matches!(&result, Err(err) if err.kind() == ErrorKind::Validation) {
            self.modal = Some(intent);
        }
        Some(result)
    }

    /// Validate an intent locally, then store it.
    ///
    /// Creating a deck is not transactional: the deck is created first, then
    /// each card in order. A failed card leaves the deck in the store. The
    /// new deck joins the list directly only when no filter is submitted.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Validation` before any request is sent, or
    /// the store's error.
    pub async fn submit(&mut self, intent: ModalIntent) -> Result<ModalOutcome, DashboardError> {
        let result = self.store(intent).await;
        match result {
            Ok(outcome) => {
                self.error = None;
                Ok(outcome)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    async fn store(&mut self, intent: ModalIntent) -> Result<ModalOutcome, DashboardError> {
        match intent {
            ModalIntent::CreateDeck(form) => {
                let (name, drafts) = form.validate()?;
                let deck = self.decks_repo.create_deck(&name).await?;
                debug!("deck {} created", deck.id());
                // A filtered list only changes when the store is asked again.
                if self.submitted.is_empty() {
                    self.decks.push(deck.clone());
                }

                let mut cards = Vec::with_capacity(drafts.len());
                for draft in drafts {
                    let card = self
                        .cards_repo
                        .create_card(deck.id(), &draft.front, &draft.back)
                        .await?;
                    cards.push(card);
                }
                Ok(ModalOutcome::DeckCreated { deck, cards })
            }
            ModalIntent::RenameDeck(form) => {
                let name = form.validate()?;
                let deck = self.decks_repo.rename_deck(&form.deck_id, &name).await?;
                if let Some(slot) = self.decks.iter_mut().find(|d| d.id() == deck.id()) {
                    *slot = deck.clone();
                }
                Ok(ModalOutcome::DeckRenamed(deck))
            }
            ModalIntent::AddCard(form) => {
                let draft = form.validate()?;
                let card = self
                    .cards_repo
                    .create_card(&form.deck_id, &draft.front, &draft.back)
                    .await?;
                Ok(ModalOutcome::CardAdded(card))
            }
            ModalIntent::EditCard(form) => {
                let draft = form.validate()?;
                let card = self
                    .cards_repo
                    .update_card(&form.card_id, &draft.front, &draft.back)
                    .await?;
                Ok(ModalOutcome::CardUpdated(card))
            }
        }
    }

    /// Delete a deck remotely, then drop it from the list.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the list is unchanged then.
    pub async fn delete_deck(&mut self, deck_id: &DeckId) -> Result<(), DashboardError> {
        match self.decks_repo.delete_deck(deck_id).await {
            Ok(()) => {
                self.decks.retain(|deck| deck.id() != deck_id);
                debug!("deck {deck_id} deleted");
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    #[must_use]
    pub fn study(&self, deck_id: &DeckId) -> Route {
        Route::Study(deck_id.clone())
    }

    #[must_use]
    pub fn edit(&self, deck_id: &DeckId) -> Route {
        Route::Editor(deck_id.clone())
    }

    #[must_use]
    pub fn error(&self) -> Option<&DashboardError> {
        self.error.as_ref()
    }

    /// The last failure was a missing or expired credential.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(|err| err.kind() == ErrorKind::Unauthenticated)
    }

    fn listed(&self, deck_id: &DeckId) -> Result<&Deck, DashboardError> {
        self.decks
            .iter()
            .find(|deck| deck.id() == deck_id)
            .ok_or_else(|| DashboardError::UnknownDeck(deck_id.clone()))
    }

    fn fail(&mut self, err: DashboardError) -> DashboardError {
        if let DashboardError::Storage(StorageError::Unauthenticated) = &err {
            warn!("dashboard: signed out, login required");
        } else {
            warn!("dashboard: {err}");
        }
        self.error = Some(err.clone());
        err
    }
}

#[cfg(test)]
mod tests {
    use storage::{InMemoryRepository, RepoOp};
    use study_core::ValidationError;
    use study_core::model::CardDraft;

    use super::*;

    fn dashboard(repo: &InMemoryRepository) -> DashboardController {
        DashboardController::new(Arc::new(repo.clone()), Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn search_is_submitted_not_filtered_locally() {
        let repo = InMemoryRepository::new();
        let _ = repo.seed_deck("Biology", &[]);
        let _ = repo.seed_deck("Chemistry", &[]);
        let mut dash = dashboard(&repo);
        dash.refresh().await.unwrap();
        assert_eq!(dash.decks().len(), 2);

        dash.set_search("chem");
        assert_eq!(dash.decks().len(), 2);
        dash.search().await.unwrap();
        assert_eq!(dash.decks().len(), 1);

        dash.refresh().await.unwrap();
        assert_eq!(repo.calls(RepoOp::ListDecks), 3);
        assert_eq!(dash.decks()[0].name(), "Chemistry");
    }

    #[tokio::test]
    async fn create_deck_needs_two_filled_cards() {
        let repo = InMemoryRepository::new();
        let mut dash = dashboard(&repo);
        dash.open_create();
        if let Some(ModalIntent::CreateDeck(form)) = dash.modal_mut() {
            form.name = "Biology".into();
            form.cards[0] = CardDraft::new("mitosis", "cell division");
        }

        let result = dash.submit_modal().await.unwrap();
        assert_eq!(
            result,
            Err(DashboardError::Validation(ValidationError::NotEnoughFilledCards))
        );
        assert_eq!(repo.total_calls(), 0);
        assert!(dash.modal().is_some());
    }

    #[tokio::test]
    async fn create_deck_stores_deck_then_cards() {
        let repo = InMemoryRepository::new();
        let mut dash = dashboard(&repo);
        let form = CreateDeckForm {
            name: "Biology".into(),
            cards: vec![
                CardDraft::new("mitosis", "cell division"),
                CardDraft::default(),
                CardDraft::new("DNA", "genetic material"),
            ],
        };

        let outcome = dash.submit(ModalIntent::CreateDeck(form)).await.unwrap();
        let ModalOutcome::DeckCreated { deck, cards } = outcome else {
            panic!("expected a created deck");
        };
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].index, 1);
        assert_eq!(dash.decks(), std::slice::from_ref(&deck));
    }

    #[tokio::test]
    async fn failed_card_leaves_the_deck_listed() {
        let repo = InMemoryRepository::new();
        repo.fail_next(RepoOp::CreateCard, StorageError::Transport("reset".into()));
        let mut dash = dashboard(&repo);
        let form = CreateDeckForm {
            name: "Biology".into(),
            cards: vec![CardDraft::new("a", "b"), CardDraft::new("c", "d")],
        };

        let err = dash.submit(ModalIntent::CreateDeck(form)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(dash.decks().len(), 1);
        assert_eq!(dash.error(), Some(&err));
    }

    #[tokio::test]
    async fn created_deck_stays_out_of_a_filtered_list() {
        let repo = InMemoryRepository::new();
        let _ = repo.seed_deck("Chemistry", &[]);
        let mut dash = dashboard(&repo);
        dash.set_search("chem");
        dash.search().await.unwrap();

        let form = CreateDeckForm {
            name: "Biology".into(),
            cards: vec![CardDraft::new("a", "b"), CardDraft::new("c", "d")],
        };
        dash.submit(ModalIntent::CreateDeck(form)).await.unwrap();
        let names: Vec<&str> = dash.decks().iter().map(Deck::name).collect();
        assert_eq!(names, vec!["Chemistry"]);

        dash.set_search("");
        dash.search().await.unwrap();
        assert_eq!(dash.decks().len(), 2);
    }

    #[tokio::test]
    async fn rename_replaces_the_listed_deck() {
        let repo = InMemoryRepository::new();
        let (deck, _) = repo.seed_deck("Biology", &[]);
        let mut dash = dashboard(&repo);
        dash.refresh().await.unwrap();

        dash.open_rename(deck.id()).unwrap();
        if let Some(ModalIntent::RenameDeck(form)) = dash.modal_mut() {
            form.name = "Botany".into();
        }
        let outcome = dash.submit_modal().await.unwrap().unwrap();

        assert!(matches!(outcome, ModalOutcome::DeckRenamed(_)));
        assert_eq!(dash.decks()[0].name(), "Botany");
        assert!(dash.modal().is_none());
    }

    #[tokio::test]
    async fn delete_failure_keeps_the_list() {
        let repo = InMemoryRepository::new();
        let (deck, _) = repo.seed_deck("Biology", &[]);
        let mut dash = dashboard(&repo);
        dash.refresh().await.unwrap();
        repo.fail_next(RepoOp::DeleteDeck, StorageError::Unauthenticated);

        assert!(dash.delete_deck(deck.id()).await.is_err());
        assert_eq!(dash.decks().len(), 1);
        assert!(dash.requires_login());

        dash.delete_deck(deck.id()).await.unwrap();
        assert!(dash.decks().is_empty());
    }

    #[test]
    fn navigation_targets() {
        let repo = InMemoryRepository::new();
        let dash = dashboard(&repo);
        let id = DeckId::new("d1");
        assert_eq!(dash.study(&id), Route::Study(id.clone()));
        assert_eq!(dash.edit(&id), Route::Editor(id));
    }
}
