use thiserror::Error;

/// Rule violations caught on the client before any request is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("name required")]
    NameRequired,

    #[error("minimum two cards")]
    MinimumCards,

    #[error("card front and back are required")]
    EmptyFace,

    #[error("at least two cards with both front and back filled are required")]
    NotEnoughFilledCards,

    #[error("deck is incomplete: a name, two cards and filled faces are required")]
    IncompleteDeck,
}
