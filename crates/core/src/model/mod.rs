mod card;
mod deck;
mod edit;
mod ids;
mod study;
mod timer;

pub use ids::{CardId, DeckId, ParseIdError, UserId};

pub use card::{Card, CardDraft, CardFace};
pub use deck::{Deck, DeckError, normalize_name};
pub use edit::{EditSession, EditableCard, EditableField, MIN_CARDS};
pub use study::{Step, StudySession, StudySessionError, WalkStatus};
pub use timer::{BREAK_SECONDS, TimerPhase, TimerState, TimerStatus, Tick, WORK_SECONDS};
