use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::AuthSession;
use crate::config::ApiConfig;
use crate::repository::StorageError;

mod card_repo;
mod deck_repo;
mod mapping;

pub(crate) use mapping::error_from_status;

/// Deck and card repositories backed by the remote JSON store.
#[derive(Clone)]
pub struct HttpRepository {
    client: Client,
    base_url: Url,
    auth: Arc<AuthSession>,
}

impl HttpRepository {
    /// # Errors
    ///
    /// Returns `StorageError::Transport` if the HTTP client cannot be built.
    pub fn new(config: ApiConfig, auth: Arc<AuthSession>) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(transport)?;
        Ok(Self {
            client,
            base_url: config.base_url().clone(),
            auth,
        })
    }

    /// Appends escaped path segments to the base URL.
    fn url(&self, segments: &[&str]) -> Result<Url, StorageError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StorageError::Transport("base url cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Builds an authorized request. Fails before sending when signed out.
    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, StorageError> {
        let token = self.auth.bearer()?;
        log::debug!("{method} {}", url.path());
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StorageError> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = error_from_status(status, &body);
        log::warn!("remote store answered {status}: {err}");
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StorageError> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(transport)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), StorageError> {
        self.send(request).await.map(drop)
    }
}

fn transport(err: reqwest::Error) -> StorageError {
    if err.status() == Some(StatusCode::UNAUTHORIZED) {
        return StorageError::Unauthenticated;
    }
    StorageError::Transport(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::UserId;

    fn repo(base: &str) -> HttpRepository {
        let auth = Arc::new(AuthSession::new(UserId::new("u1"), "token"));
        HttpRepository::new(ApiConfig::new(base).unwrap(), auth).unwrap()
    }

    #[test]
    fn url_escapes_segments() {
        let repo = repo("http://localhost:8080/api/v1/");
        let url = repo.url(&["decks", "a/b c", "cards"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/v1/decks/a%2Fb%20c/cards");
    }

    #[test]
    fn url_without_trailing_slash() {
        let repo = repo("http://localhost:8080/api/v1");
        let url = repo.url(&["decks"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/v1/decks");
    }

    #[test]
    fn signed_out_request_is_not_built() {
        let repo = repo("http://localhost:8080/");
        repo.auth.logout();
        let url = repo.url(&["decks"]).unwrap();
        assert!(matches!(
            repo.request(Method::GET, url),
            Err(StorageError::Unauthenticated)
        ));
    }
}
