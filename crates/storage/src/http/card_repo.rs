use reqwest::Method;
use study_core::model::{Card, CardId, DeckId};

use super::HttpRepository;
use super::mapping::{CardBody, CardRecord};
use crate::repository::{CardRepository, StorageError, order_cards};

#[async_trait::async_trait]
impl CardRepository for HttpRepository {
    async fn list_cards(&self, deck_id: &DeckId) -> Result<Vec<Card>, StorageError> {
        let url = self.url(&["decks", deck_id.as_str(), "cards"])?;
        let records: Vec<CardRecord> = self.send_json(self.request(Method::GET, url)?).await?;
        let mut cards: Vec<Card> = records.into_iter().map(Card::from).collect();
        // Stable sort: equal indexes keep the order the store sent.
        order_cards(&mut cards);
        Ok(cards)
    }

    async fn create_card(
        &self,
        deck_id: &DeckId,
        front: &str,
        back: &str,
    ) -> Result<Card, StorageError> {
        let url = self.url(&["decks", deck_id.as_str(), "cards"])?;
        let request = self
            .request(Method::POST, url)?
            .json(&CardBody { front, back });
        let record: CardRecord = self.send_json(request).await?;
        Ok(record.into())
    }

    async fn update_card(
        &self,
        id: &CardId,
        front: &str,
        back: &str,
    ) -> Result<Card, StorageError> {
        let url = self.url(&["cards", id.as_str()])?;
        let request = self
            .request(Method::PUT, url)?
            .json(&CardBody { front, back });
        let record: CardRecord = self.send_json(request).await?;
        Ok(record.into())
    }

    async fn delete_card(&self, id: &CardId) -> Result<(), StorageError> {
        let url = self.url(&["cards", id.as_str()])?;
        self.send_empty(self.request(Method::DELETE, url)?).await
    }
}
