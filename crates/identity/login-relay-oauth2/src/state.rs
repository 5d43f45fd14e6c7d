//! Pending-login state for CSRF protection.

use crate::error::{OAuth2Error, OAuth2Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// One in-flight authorization round trip, keyed by its state parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingLogin {
    pub state: String,
    pub provider_id: String,
    /// The loopback redirect URI this flow was started with. The port may be
    /// ephemeral, so the exchange must reuse exactly this value.
    pub redirect_uri: String,
    pub code_verifier: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PendingLogin {
    pub fn new(
        provider_id: String,
        redirect_uri: String,
        code_verifier: Option<String>,
        ttl_seconds: u64,
    ) -> Self {
        let state = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + Duration::seconds(ttl_seconds as i64);

        Self {
            state,
            provider_id,
            redirect_uri,
            code_verifier,
            created_at,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Storage for in-flight logins. Retrieval consumes the entry, so each state
/// parameter is honored at most once.
#[async_trait]
pub trait LoginStateStore: Send + Sync {
    async fn store(&self, login: PendingLogin) -> OAuth2Result<()>;

    /// Retrieve and remove a pending login by its state parameter.
    async fn retrieve(&self, state: &str) -> OAuth2Result<PendingLogin>;

    /// Drop expired entries, returning how many were removed.
    async fn cleanup_expired(&self) -> OAuth2Result<usize>;
}

/// In-memory implementation of [`LoginStateStore`]
pub struct InMemoryLoginStore {
    logins: Arc<RwLock<HashMap<String, PendingLogin>>>,
}

impl InMemoryLoginStore {
    pub fn new() -> Self {
        Self {
            logins: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryLoginStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoginStateStore for InMemoryLoginStore {
    async fn store(&self, login: PendingLogin) -> OAuth2Result<()> {
        let mut logins = self.logins.write().await;
        logins.insert(login.state.clone(), login);
        Ok(())
    }

    async fn retrieve(&self, state: &str) -> OAuth2Result<PendingLogin> {
        let mut logins = self.logins.write().await;

        let login = logins.remove(state).ok_or(OAuth2Error::StateNotFound)?;

        if login.is_expired() {
            return Err(OAuth2Error::StateNotFound);
        }

        Ok(login)
    }

    async fn cleanup_expired(&self) -> OAuth2Result<usize> {
        let mut logins = self.logins.write().await;
        let now = Utc::now();

        let expired_keys: Vec<String> = logins
            .iter()
            .filter(|(_, login)| now > login.expires_at)
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            logins.remove(&key);
        }

        Ok(count)
    }
}
