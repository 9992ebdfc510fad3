use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use log::{debug, warn};
use storage::{CardRepository, DeckRepository, StorageError};
use study_core::model::{Card, CardFace, DeckId, Step, StudySession, WalkStatus};

use crate::Clock;
use crate::error::StudyError;

/// Observable state of a study page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyState {
    Loading,
    Ready,
    Exhausted,
    Error,
    Ended,
}

impl fmt::Display for StudyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StudyState::Loading => "loading",
            StudyState::Ready => "ready",
            StudyState::Exhausted => "exhausted",
            StudyState::Error => "failed",
            StudyState::Ended => "ended",
        };
        f.write_str(label)
    }
}

enum Phase {
    Loading,
    Active(StudySession),
    Failed(StudyError),
    Ended,
}

/// Drives one walk through a deck's cards.
///
/// Cards are fetched once on `load`; navigation afterwards never touches
/// the network.
pub struct StudySessionController {
    clock: Clock,
    decks: Arc<dyn DeckRepository>,
    cards: Arc<dyn CardRepository>,
    phase: Phase,
}

impl StudySessionController {
    #[must_use]
    pub fn new(clock: Clock, decks: Arc<dyn DeckRepository>, cards: Arc<dyn CardRepository>) -> Self {
        Self {
            clock,
            decks,
            cards,
            phase: Phase::Loading,
        }
    }

    /// Fetch the deck and its ordered cards, then start at the first card.
    ///
    /// A missing deck or a deck without cards fails with `NotFound`. Any
    /// failure is terminal for this controller.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::InvalidState` unless the controller is loading,
    /// or `StudyError::Storage` when the fetch fails.
    pub async fn load(&mut self, deck_id: &DeckId) -> Result<(), StudyError> {
        self.ensure(StudyState::Loading)?;
        match self.fetch(deck_id).await {
            Ok(session) => {
                debug!("study session for deck {deck_id} ready with {} cards", session.len());
                self.phase = Phase::Active(session);
                Ok(())
            }
            Err(err) => {
                warn!("study session for deck {deck_id} failed to load: {err}");
                self.phase = Phase::Failed(err.clone());
                Err(err)
            }
        }
    }

    async fn fetch(&self, deck_id: &DeckId) -> Result<StudySession, StudyError> {
        let deck = self.decks.get_deck(deck_id).await?;
        let cards = self.cards.list_cards(deck_id).await?;
        StudySession::new(deck, cards, self.clock.now())
            .map_err(|_| StudyError::Storage(StorageError::NotFound))
    }

    /// # Errors
    ///
    /// Returns `StudyError::InvalidState` unless a card is being reviewed.
    pub fn flip(&mut self) -> Result<CardFace, StudyError> {
        let session = self.reviewing()?;
        session.flip();
        Ok(session.orientation())
    }

    /// Advance one card, or mark the walk exhausted on the last card.
    ///
    /// Calling it again once exhausted keeps the position.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::InvalidState` outside of `Ready` and `Exhausted`.
    pub fn next(&mut self) -> Result<Step, StudyError> {
        let state = self.state();
        match &mut self.phase {
            Phase::Active(session) => {
                let step = session.next();
                if step == Step::Exhausted && state == StudyState::Ready {
                    debug!("study session exhausted at card {}", session.position() + 1);
                }
                Ok(step)
            }
            _ => Err(StudyError::InvalidState { state }),
        }
    }

    /// Step back one card. Returns false at the first card.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::InvalidState` unless a card is being reviewed.
    pub fn previous(&mut self) -> Result<bool, StudyError> {
        Ok(self.reviewing()?.previous())
    }

    /// Discard the walk. Nothing is persisted.
    pub fn end(&mut self) {
        debug!("study session ended from state {}", self.state());
        self.phase = Phase::Ended;
    }

    #[must_use]
    pub fn state(&self) -> StudyState {
        match &self.phase {
            Phase::Loading => StudyState::Loading,
            Phase::Active(session) => match session.status() {
                WalkStatus::Reviewing => StudyState::Ready,
                WalkStatus::Exhausted => StudyState::Exhausted,
            },
            Phase::Failed(_) => StudyState::Error,
            Phase::Ended => StudyState::Ended,
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&StudySession> {
        match &self.phase {
            Phase::Active(session) => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn position(&self) -> Option<usize> {
        self.session().map(StudySession::position)
    }

    #[must_use]
    pub fn orientation(&self) -> Option<CardFace> {
        self.session().map(StudySession::orientation)
    }

    #[must_use]
    pub fn current_card(&self) -> Option<&Card> {
        self.session().map(StudySession::current_card)
    }

    #[must_use]
    pub fn displayed_text(&self) -> Option<&str> {
        self.session().map(StudySession::displayed_text)
    }

    #[must_use]
    pub fn deck_name(&self) -> Option<&str> {
        self.session().map(|session| session.deck().name())
    }

    /// One-based position and total.
    #[must_use]
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.session().map(StudySession::progress)
    }

    #[must_use]
    pub fn error(&self) -> Option<&StudyError> {
        match &self.phase {
            Phase::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Time since the walk started, by the controller's clock.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.session()
            .map(|session| self.clock.elapsed_since(session.started_at()))
    }

    fn ensure(&self, expected: StudyState) -> Result<(), StudyError> {
        let state = self.state();
        if state == expected {
            Ok(())
        } else {
            Err(StudyError::InvalidState { state })
        }
    }

    fn reviewing(&mut self) -> Result<&mut StudySession, StudyError> {
        let state = self.state();
        match &mut self.phase {
            Phase::Active(session) if state == StudyState::Ready => Ok(session),
            _ => Err(StudyError::InvalidState { state }),
        }
    }
}

#[cfg(test)]
mod tests {
    use storage::{InMemoryRepository, RepoOp};
    use study_core::time::fixed_clock;

    use super::*;
    use crate::error::ErrorKind;

    fn controller(repo: &InMemoryRepository) -> StudySessionController {
        StudySessionController::new(fixed_clock(), Arc::new(repo.clone()), Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn biology_walk() {
        let repo = InMemoryRepository::new();
        let (deck, _) = repo.seed_deck(
            "Biology",
            &[("mitosis", "cell division"), ("DNA", "genetic material")],
        );
        let mut study = controller(&repo);
        study.load(deck.id()).await.unwrap();

        assert_eq!(study.state(), StudyState::Ready);
        assert_eq!(study.displayed_text(), Some("mitosis"));
        assert_eq!(study.flip().unwrap(), CardFace::Back);
        assert_eq!(study.displayed_text(), Some("cell division"));
        assert_eq!(study.next().unwrap(), Step::Advanced);
        assert_eq!(study.displayed_text(), Some("DNA"));
        assert_eq!(study.progress(), Some((2, 2)));
        assert_eq!(study.next().unwrap(), Step::Exhausted);
        assert_eq!(study.state(), StudyState::Exhausted);
        assert_eq!(study.next().unwrap(), Step::Exhausted);
        assert_eq!(study.position(), Some(1));
    }

    #[tokio::test]
    async fn previous_at_first_card_is_a_no_op() {
        let repo = InMemoryRepository::new();
        let (deck, _) = repo.seed_deck("Biology", &[("a", "b"), ("c", "d")]);
        let mut study = controller(&repo);
        study.load(deck.id()).await.unwrap();

        assert!(!study.previous().unwrap());
        assert_eq!(study.position(), Some(0));
    }

    #[tokio::test]
    async fn empty_deck_fails_with_not_found() {
        let repo = InMemoryRepository::new();
        let (deck, _) = repo.seed_deck("Empty", &[]);
        let mut study = controller(&repo);

        let err = study.load(deck.id()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(study.state(), StudyState::Error);
        assert!(study.current_card().is_none());
    }

    #[tokio::test]
    async fn transport_failure_leaves_no_partial_state() {
        let repo = InMemoryRepository::new();
        let (deck, _) = repo.seed_deck("Biology", &[("a", "b")]);
        repo.fail_next(RepoOp::ListCards, StorageError::Transport("reset".into()));
        let mut study = controller(&repo);

        let err = study.load(deck.id()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(study.session().is_none());
        assert_eq!(study.error(), Some(&err));
        assert_eq!(
            study.load(deck.id()).await,
            Err(StudyError::InvalidState {
                state: StudyState::Error
            })
        );
    }

    #[tokio::test]
    async fn navigation_before_load_is_rejected() {
        let repo = InMemoryRepository::new();
        let mut study = controller(&repo);
        assert_eq!(
            study.flip(),
            Err(StudyError::InvalidState {
                state: StudyState::Loading
            })
        );
        assert_eq!(repo.total_calls(), 0);
    }

    #[tokio::test]
    async fn end_discards_the_walk() {
        let repo = InMemoryRepository::new();
        let (deck, _) = repo.seed_deck("Biology", &[("a", "b")]);
        let mut study = controller(&repo);
        study.load(deck.id()).await.unwrap();
        study.end();

        assert_eq!(study.state(), StudyState::Ended);
        assert!(study.next().is_err());
        assert_eq!(study.elapsed(), None);
    }
}
