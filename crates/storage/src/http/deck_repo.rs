use reqwest::Method;
use study_core::model::{Deck, DeckId};

use super::HttpRepository;
use super::mapping::{DeckNameBody, DeckRecord};
use crate::repository::{DeckRepository, StorageError};

#[async_trait::async_trait]
impl DeckRepository for HttpRepository {
    async fn list_decks(&self, name_filter: &str) -> Result<Vec<Deck>, StorageError> {
        let mut url = self.url(&["decks"])?;
        let filter = name_filter.trim();
        if !filter.is_empty() {
            url.query_pairs_mut().append_pair("name", filter);
        }
        let records: Vec<DeckRecord> = self.send_json(self.request(Method::GET, url)?).await?;
        records.into_iter().map(DeckRecord::into_deck).collect()
    }

    async fn get_deck(&self, id: &DeckId) -> Result<Deck, StorageError> {
        let url = self.url(&["decks", id.as_str()])?;
        let record: DeckRecord = self.send_json(self.request(Method::GET, url)?).await?;
        record.into_deck()
    }

    async fn create_deck(&self, name: &str) -> Result<Deck, StorageError> {
        let url = self.url(&["decks"])?;
        let request = self
            .request(Method::POST, url)?
            .json(&DeckNameBody { name });
        let record: DeckRecord = self.send_json(request).await?;
        record.into_deck()
    }

    async fn rename_deck(&self, id: &DeckId, name: &str) -> Result<Deck, StorageError> {
        let url = self.url(&["decks", id.as_str()])?;
        let request = self
            .request(Method::PUT, url)?
            .json(&DeckNameBody { name });
        let record: DeckRecord = self.send_json(request).await?;
        record.into_deck()
    }

    async fn delete_deck(&self, id: &DeckId) -> Result<(), StorageError> {
        let url = self.url(&["decks", id.as_str()])?;
        self.send_empty(self.request(Method::DELETE, url)?).await
    }
}
