#![forbid(unsafe_code)]

pub mod app_services;
pub mod dashboard;
pub mod deck_editor;
pub mod error;
pub mod focus_timer;
pub mod modal;
pub mod route;
pub mod study_session;

pub use study_core::Clock;

pub use app_services::AppServices;
pub use dashboard::DashboardController;
pub use deck_editor::{CommitOutcome, DeckEditorController, FieldCommit, FieldKey};
pub use error::{AppServicesError, DashboardError, EditorError, ErrorKind, StudyError};
pub use focus_timer::FocusTimer;
pub use modal::{
    AddCardForm, CreateDeckForm, EditCardForm, ModalIntent, ModalOutcome, RenameDeckForm,
};
pub use route::Route;
pub use study_session::{StudySessionController, StudyState};
