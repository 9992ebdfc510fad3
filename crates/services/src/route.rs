use study_core::model::DeckId;

/// Where the navigation shell should go next. Pages are addressed by deck id only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Study(DeckId),
    Editor(DeckId),
    /// The credential is missing or expired; the shell owns the login flow.
    Login,
}
