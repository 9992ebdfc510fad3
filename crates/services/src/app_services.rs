use std::sync::Arc;

use storage::{ApiConfig, AuthSession, InMemoryRepository, Storage};
use study_core::model::UserId;

use crate::Clock;
use crate::dashboard::DashboardController;
use crate::deck_editor::DeckEditorController;
use crate::error::AppServicesError;
use crate::focus_timer::FocusTimer;
use crate::study_session::StudySessionController;

/// Assembles page controllers over one storage backend and auth session.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    storage: Storage,
    auth: Arc<AuthSession>,
}

impl AppServices {
    /// Build services backed by the remote store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be built.
    pub fn http(
        config: ApiConfig,
        auth: Arc<AuthSession>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::http(config, Arc::clone(&auth))?;
        Ok(Self {
            clock,
            storage,
            auth,
        })
    }

    /// Build services from `STUDY_API_URL`, `STUDY_API_TIMEOUT_SECS`,
    /// `STUDY_USER_ID` and `STUDY_API_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` for missing or malformed configuration.
    pub fn from_env(clock: Clock) -> Result<Self, AppServicesError> {
        let config = ApiConfig::from_env()?;
        let auth = AuthSession::from_env()?;
        Self::http(config, Arc::new(auth), clock)
    }

    /// Build services over an in-memory store.
    #[must_use]
    pub fn in_memory(repo: InMemoryRepository, clock: Clock) -> Self {
        Self {
            clock,
            storage: Storage::from_in_memory(repo),
            auth: Arc::new(AuthSession::new(UserId::new("local"), "local")),
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthSession> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn dashboard(&self) -> DashboardController {
        DashboardController::new(
            Arc::clone(&self.storage.decks),
            Arc::clone(&self.storage.cards),
        )
    }

    #[must_use]
    pub fn study_session(&self) -> StudySessionController {
        StudySessionController::new(
            self.clock,
            Arc::clone(&self.storage.decks),
            Arc::clone(&self.storage.cards),
        )
    }

    #[must_use]
    pub fn deck_editor(&self) -> DeckEditorController {
        DeckEditorController::new(
            Arc::clone(&self.storage.decks),
            Arc::clone(&self.storage.cards),
        )
    }

    /// A fresh timer. It only ticks when started inside a tokio runtime.
    #[must_use]
    pub fn focus_timer(&self) -> FocusTimer {
        FocusTimer::new()
    }
}
