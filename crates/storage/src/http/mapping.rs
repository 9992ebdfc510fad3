use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use study_core::model::{Card, CardId, Deck, DeckId, UserId};

use crate::repository::StorageError;

/// Deck as it travels over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeckRecord {
    pub id: DeckId,
    pub owner_id: UserId,
    pub name: String,
}

impl DeckRecord {
    /// # Errors
    ///
    /// Returns `StorageError::Transport` if the store sent a nameless deck.
    pub fn into_deck(self) -> Result<Deck, StorageError> {
        Deck::new(self.id, self.owner_id, self.name)
            .map_err(|e| StorageError::Transport(format!("malformed deck from store: {e}")))
    }
}

/// Card as it travels over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CardRecord {
    pub id: CardId,
    pub deck_id: DeckId,
    pub front: String,
    pub back: String,
    pub index: u32,
}

impl From<CardRecord> for Card {
    fn from(record: CardRecord) -> Self {
        Card {
            id: record.id,
            deck_id: record.deck_id,
            front: record.front,
            back: record.back,
            index: record.index,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DeckNameBody<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CardBody<'a> {
    pub front: &'a str,
    pub back: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Maps a non-success response onto the storage error taxonomy.
pub(crate) fn error_from_status(status: StatusCode, body: &str) -> StorageError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_owned());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StorageError::Unauthenticated,
        StatusCode::NOT_FOUND => StorageError::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            StorageError::ValidationRejected(message)
        }
        _ if message.is_empty() => StorageError::Transport(status.to_string()),
        _ => StorageError::Transport(format!("{status}: {message}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_map_to_unauthenticated() {
        assert_eq!(
            error_from_status(StatusCode::UNAUTHORIZED, ""),
            StorageError::Unauthenticated
        );
        assert_eq!(
            error_from_status(StatusCode::FORBIDDEN, "{\"message\":\"expired\"}"),
            StorageError::Unauthenticated
        );
    }

    #[test]
    fn rule_violations_keep_the_server_message() {
        let err = error_from_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            "{\"message\":\"deck name taken\"}",
        );
        assert_eq!(err, StorageError::ValidationRejected("deck name taken".into()));
    }

    #[test]
    fn server_errors_are_retryable_transport() {
        let err = error_from_status(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(
            err,
            StorageError::Transport("502 Bad Gateway: upstream down".into())
        );
        assert!(err.is_retryable());
        assert_eq!(error_from_status(StatusCode::NOT_FOUND, ""), StorageError::NotFound);
    }

    #[test]
    fn wire_records_use_camel_case() {
        let record: CardRecord = serde_json::from_str(
            r#"{"id":"c1","deckId":"d1","front":"DNA","back":"genetic material","index":3}"#,
        )
        .unwrap();
        let card = Card::from(record);
        assert_eq!(card.deck_id, DeckId::new("d1"));
        assert_eq!(card.index, 3);

        let deck: DeckRecord =
            serde_json::from_str(r#"{"id":"d1","ownerId":"u1","name":"Biology"}"#).unwrap();
        assert_eq!(deck.into_deck().unwrap().name(), "Biology");
    }
}
