#![forbid(unsafe_code)]

pub mod auth;
pub mod config;
pub mod http;
pub mod repository;

pub use auth::AuthSession;
pub use config::{ApiConfig, ConfigError};
pub use http::HttpRepository;
pub use repository::{
    CardRepository, DeckRepository, InMemoryRepository, RepoOp, Storage, StorageError,
};
