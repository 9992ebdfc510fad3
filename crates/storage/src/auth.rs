use std::env;
use std::fmt;
use std::sync::RwLock;

use study_core::model::UserId;

use crate::config::ConfigError;
use crate::repository::StorageError;

/// The signed-in user and their bearer credential.
///
/// Built once at startup and shared by reference with every repository.
/// `logout` drops the credential, after which every request fails with
/// `StorageError::Unauthenticated`.
pub struct AuthSession {
    user_id: UserId,
    token: RwLock<Option<String>>,
}

impl AuthSession {
    #[must_use]
    pub fn new(user_id: UserId, token: impl Into<String>) -> Self {
        let token = token.into();
        let token = (!token.trim().is_empty()).then_some(token);
        Self {
            user_id,
            token: RwLock::new(token),
        }
    }

    /// Reads `STUDY_USER_ID` and `STUDY_API_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnv` if either variable is unset or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        let user_id = required_env("STUDY_USER_ID")?;
        let token = required_env("STUDY_API_TOKEN")?;
        Ok(Self::new(UserId::new(user_id), token))
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// # Errors
    ///
    /// Returns `StorageError::Unauthenticated` once the session has ended.
    pub fn bearer(&self) -> Result<String, StorageError> {
        self.token
            .read()
            .map_err(|_| StorageError::Unauthenticated)?
            .clone()
            .ok_or(StorageError::Unauthenticated)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    pub fn logout(&self) {
        match self.token.write() {
            Ok(mut token) => *token = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
        log::info!("session for user {} ended", self.user_id);
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("user_id", &self.user_id)
            .field("active", &self.is_active())
            .finish()
    }
}

fn required_env(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingEnv(name))
}
