//! Shared error types for the services crate.

use thiserror::Error;

use storage::{ConfigError, StorageError};
use study_core::ValidationError;
use study_core::model::{CardId, DeckId};

use crate::route::Route;
use crate::study_session::StudyState;

/// Coarse classification the pages use to pick a message or a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    Validation,
    NotFound,
    Transport,
}

impl From<&StorageError> for ErrorKind {
    fn from(err: &StorageError) -> Self {
        match err {
            StorageError::Unauthenticated => ErrorKind::Unauthenticated,
            StorageError::NotFound => ErrorKind::NotFound,
            StorageError::ValidationRejected(_) => ErrorKind::Validation,
            _ => ErrorKind::Transport,
        }
    }
}

fn login_redirect(kind: ErrorKind) -> Option<Route> {
    (kind == ErrorKind::Unauthenticated).then_some(Route::Login)
}

/// Errors emitted by `StudySessionController`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudyError {
    #[error("not available while the session is {state}")]
    InvalidState { state: StudyState },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StudyError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            StudyError::InvalidState { .. } => ErrorKind::Validation,
            StudyError::Storage(err) => err.into(),
        }
    }

    /// `Route::Login` when the credential is missing or expired.
    #[must_use]
    pub fn redirect(&self) -> Option<Route> {
        login_redirect(self.kind())
    }
}

/// Errors emitted by `DeckEditorController`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditorError {
    #[error("no deck is loaded")]
    NotLoaded,
    #[error("card {0} is not in this deck")]
    UnknownCard(CardId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl EditorError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditorError::NotLoaded | EditorError::UnknownCard(_) => ErrorKind::NotFound,
            EditorError::Validation(_) => ErrorKind::Validation,
            EditorError::Storage(err) => err.into(),
        }
    }

    #[must_use]
    pub fn redirect(&self) -> Option<Route> {
        login_redirect(self.kind())
    }
}

/// Errors emitted by `DashboardController`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DashboardError {
    #[error("deck {0} is not listed")]
    UnknownDeck(DeckId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DashboardError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            DashboardError::UnknownDeck(_) => ErrorKind::NotFound,
            DashboardError::Validation(_) => ErrorKind::Validation,
            DashboardError::Storage(err) => err.into(),
        }
    }

    #[must_use]
    pub fn redirect(&self) -> Option<Route> {
        login_redirect(self.kind())
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
