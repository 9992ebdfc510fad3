use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use storage::repository::{CardRepository, DeckRepository, Storage, StorageError};
use storage::{ApiConfig, AuthSession};
use study_core::model::{CardId, DeckId, UserId};

const TOKEN: &str = "good-token";

#[derive(Default)]
struct Stub {
    next_id: u32,
    requests: usize,
    decks: Vec<Value>,
    cards: Vec<Value>,
}

type Shared = Arc<Mutex<Stub>>;

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

/// Counts the request and checks the bearer credential.
fn enter(state: &Shared, headers: &HeaderMap) -> Result<(), Response> {
    state.lock().unwrap().requests += 1;
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == format!("Bearer {TOKEN}") => Ok(()),
        _ => Err(reply(StatusCode::UNAUTHORIZED, json!({ "message": "invalid token" }))),
    }
}

fn blank(body: &Value, key: &str) -> bool {
    body[key].as_str().is_none_or(|s| s.trim().is_empty())
}

async fn list_decks(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(r) = enter(&state, &headers) {
        return r;
    }
    let needle = params.get("name").cloned().unwrap_or_default().to_lowercase();
    let stub = state.lock().unwrap();
    let found: Vec<Value> = stub
        .decks
        .iter()
        .filter(|d| d["name"].as_str().unwrap().to_lowercase().contains(&needle))
        .cloned()
        .collect();
    reply(StatusCode::OK, Value::Array(found))
}

async fn create_deck(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(r) = enter(&state, &headers) {
        return r;
    }
    if blank(&body, "name") {
        return reply(StatusCode::UNPROCESSABLE_ENTITY, json!({ "message": "name required" }));
    }
    let mut stub = state.lock().unwrap();
    stub.next_id += 1;
    let deck = json!({ "id": format!("d{}", stub.next_id), "ownerId": "u1", "name": body["name"] });
    stub.decks.push(deck.clone());
    reply(StatusCode::CREATED, deck)
}

async fn get_deck(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(r) = enter(&state, &headers) {
        return r;
    }
    if id == "broken" {
        return reply(StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "database offline" }));
    }
    let stub = state.lock().unwrap();
    match stub.decks.iter().find(|d| d["id"] == id) {
        Some(deck) => reply(StatusCode::OK, deck.clone()),
        None => reply(StatusCode::NOT_FOUND, json!({ "message": "deck not found" })),
    }
}

async fn rename_deck(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(r) = enter(&state, &headers) {
        return r;
    }
    let mut stub = state.lock().unwrap();
    match stub.decks.iter_mut().find(|d| d["id"] == id) {
        Some(deck) => {
            deck["name"] = body["name"].clone();
            reply(StatusCode::OK, deck.clone())
        }
        None => reply(StatusCode::NOT_FOUND, json!({ "message": "deck not found" })),
    }
}

async fn delete_deck(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(r) = enter(&state, &headers) {
        return r;
    }
    let mut stub = state.lock().unwrap();
    stub.decks.retain(|d| d["id"] != id);
    stub.cards.retain(|c| c["deckId"] != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn list_cards(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(r) = enter(&state, &headers) {
        return r;
    }
    let stub = state.lock().unwrap();
    // Newest first, so the client has to restore index order itself.
    let cards: Vec<Value> = stub
        .cards
        .iter()
        .rev()
        .filter(|c| c["deckId"] == id)
        .cloned()
        .collect();
    reply(StatusCode::OK, Value::Array(cards))
}

async fn create_card(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(r) = enter(&state, &headers) {
        return r;
    }
    let mut stub = state.lock().unwrap();
    let index = stub.cards.iter().filter(|c| c["deckId"] == id).count();
    stub.next_id += 1;
    let card = json!({
        "id": format!("c{}", stub.next_id),
        "deckId": id,
        "front": body["front"],
        "back": body["back"],
        "index": index,
    });
    stub.cards.push(card.clone());
    reply(StatusCode::CREATED, card)
}

async fn update_card(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(r) = enter(&state, &headers) {
        return r;
    }
    let mut stub = state.lock().unwrap();
    match stub.cards.iter_mut().find(|c| c["id"] == id) {
        Some(card) => {
            card["front"] = body["front"].clone();
            card["back"] = body["back"].clone();
            reply(StatusCode::OK, card.clone())
        }
        None => reply(StatusCode::NOT_FOUND, json!({ "message": "card not found" })),
    }
}

async fn delete_card(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(r) = enter(&state, &headers) {
        return r;
    }
    let mut stub = state.lock().unwrap();
    let before = stub.cards.len();
    stub.cards.retain(|c| c["id"] != id);
    if stub.cards.len() == before {
        return reply(StatusCode::NOT_FOUND, json!({ "message": "card not found" }));
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn spawn_stub() -> (ApiConfig, Shared) {
    let state = Shared::default();
    let app = Router::new()
        .route("/api/v1/decks", get(list_decks).post(create_deck))
        .route(
            "/api/v1/decks/{id}",
            get(get_deck).put(rename_deck).delete(delete_deck),
        )
        .route("/api/v1/decks/{id}/cards", get(list_cards).post(create_card))
        .route("/api/v1/cards/{id}", put(update_card).delete(delete_card))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ApiConfig::new(&format!("http://{addr}/api/v1/")).unwrap();
    (config, state)
}

fn storage(config: ApiConfig, token: &str) -> (Storage, Arc<AuthSession>) {
    let auth = Arc::new(AuthSession::new(UserId::new("u1"), token));
    let storage = Storage::http(config, Arc::clone(&auth)).unwrap();
    (storage, auth)
}

#[tokio::test]
async fn deck_and_card_lifecycle_over_http() {
    let (config, _stub) = spawn_stub().await;
    let (storage, _auth) = storage(config, TOKEN);

    let deck = storage.decks.create_deck("Biology").await.unwrap();
    assert_eq!(deck.name(), "Biology");
    assert_eq!(deck.owner_id(), &UserId::new("u1"));
    storage.decks.create_deck("Chemistry").await.unwrap();

    let found = storage.decks.list_decks("bio").await.unwrap();
    assert_eq!(found, vec![deck.clone()]);

    let mitosis = storage
        .cards
        .create_card(deck.id(), "mitosis", "cell division")
        .await
        .unwrap();
    let dna = storage
        .cards
        .create_card(deck.id(), "DNA", "genetic material")
        .await
        .unwrap();

    let first = storage.cards.list_cards(deck.id()).await.unwrap();
    let second = storage.cards.list_cards(deck.id()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, vec![mitosis.clone(), dna.clone()]);

    let updated = storage
        .cards
        .update_card(&dna.id, "DNA", "deoxyribonucleic acid")
        .await
        .unwrap();
    assert_eq!(updated.back, "deoxyribonucleic acid");

    storage.cards.delete_card(&mitosis.id).await.unwrap();
    assert_eq!(
        storage.cards.delete_card(&mitosis.id).await,
        Err(StorageError::NotFound)
    );

    let renamed = storage.decks.rename_deck(deck.id(), "Cell Biology").await.unwrap();
    assert_eq!(renamed.name(), "Cell Biology");

    storage.decks.delete_deck(deck.id()).await.unwrap();
    assert_eq!(
        storage.decks.get_deck(deck.id()).await,
        Err(StorageError::NotFound)
    );
}

#[tokio::test]
async fn rejected_credential_is_unauthenticated() {
    let (config, _stub) = spawn_stub().await;
    let (storage, _auth) = storage(config, "stale-token");
    assert_eq!(
        storage.decks.list_decks("").await,
        Err(StorageError::Unauthenticated)
    );
}

#[tokio::test]
async fn signed_out_session_sends_nothing() {
    let (config, stub) = spawn_stub().await;
    let (storage, auth) = storage(config, TOKEN);
    auth.logout();
    assert_eq!(
        storage.cards.update_card(&CardId::new("c1"), "a", "b").await,
        Err(StorageError::Unauthenticated)
    );
    assert_eq!(stub.lock().unwrap().requests, 0);
}

#[tokio::test]
async fn server_rules_and_failures_are_classified() {
    let (config, _stub) = spawn_stub().await;
    let (storage, _auth) = storage(config, TOKEN);

    assert_eq!(
        storage.decks.create_deck(" ").await,
        Err(StorageError::ValidationRejected("name required".into()))
    );

    let err = storage.decks.get_deck(&DeckId::new("broken")).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(
        err,
        StorageError::Transport("500 Internal Server Error: database offline".into())
    );
}
