//! The OAuth2 realization of the identity backend seam.

use crate::client::OAuth2Client;
use crate::config::{OAuth2Config, OAuth2ProviderConfig};
use crate::error::{OAuth2Error, OAuth2Result};
use crate::listener::CallbackListener;
use crate::state::{InMemoryLoginStore, LoginStateStore};
use crate::types::{AuthorizationCallback, UserInfoResponse};
use async_trait::async_trait;
use login_relay_core::{AuthResult, AuthUser, IdentityBackend};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// How the authorization URL reaches the user. Off-browser nothing can
/// navigate on the user's behalf, so the host decides: log it, print it,
/// or launch a browser.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> OAuth2Result<()>;
}

impl<F> UrlOpener for F
where
    F: Fn(&str) -> OAuth2Result<()> + Send + Sync,
{
    fn open(&self, url: &str) -> OAuth2Result<()> {
        self(url)
    }
}

/// Default opener: logs the URL for the operator to follow.
pub struct LogOpener;

impl UrlOpener for LogOpener {
    fn open(&self, url: &str) -> OAuth2Result<()> {
        info!("To continue signing in, open: {}", url);
        Ok(())
    }
}

struct PendingCallback {
    provider_id: String,
    callback: AuthorizationCallback,
}

/// OAuth2 Authorization Code backend.
///
/// Owns one session slot for its lifetime; all adapter operations act on
/// that single slot. Session persistence stays with the host, which can
/// seed the slot through [`with_restored_session`].
///
/// [`with_restored_session`]: OAuth2Backend::with_restored_session
pub struct OAuth2Backend {
    config: OAuth2Config,
    client: OAuth2Client,
    opener: Arc<dyn UrlOpener>,
    session: RwLock<Option<AuthUser>>,
    pending: Mutex<Option<PendingCallback>>,
}

impl OAuth2Backend {
    pub fn new(config: OAuth2Config) -> Self {
        let state_store: Arc<dyn LoginStateStore> = Arc::new(InMemoryLoginStore::new());
        Self::with_state_store(config, state_store)
    }

    pub fn with_state_store(config: OAuth2Config, state_store: Arc<dyn LoginStateStore>) -> Self {
        let client = OAuth2Client::new(
            state_store,
            config.state_ttl_seconds,
            config.http_timeout_seconds,
        );

        Self {
            config,
            client,
            opener: Arc::new(LogOpener),
            session: RwLock::new(None),
            pending: Mutex::new(None),
        }
    }

    pub fn with_opener(mut self, opener: Arc<dyn UrlOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Seed the session slot with a previously persisted user.
    pub fn with_restored_session(self, user: AuthUser) -> Self {
        Self {
            session: RwLock::new(Some(user)),
            ..self
        }
    }

    fn get_provider_config(&self, provider_id: &str) -> OAuth2Result<&OAuth2ProviderConfig> {
        self.config
            .providers
            .get(provider_id)
            .ok_or_else(|| OAuth2Error::ProviderNotFound(provider_id.to_string()))
    }

    fn map_user_info(provider_id: &str, user_info: UserInfoResponse) -> AuthUser {
        let mut metadata = serde_json::Map::new();
        if let Some(picture) = user_info.picture {
            metadata.insert("picture".to_string(), serde_json::Value::String(picture));
        }
        if let Some(verified) = user_info.email_verified {
            metadata.insert(
                "email_verified".to_string(),
                serde_json::Value::Bool(verified),
            );
        }
        for (key, value) in user_info.additional_claims {
            metadata.insert(key, value);
        }

        AuthUser {
            provider_id: provider_id.to_string(),
            subject: user_info.sub,
            email: user_info.email,
            display_name: user_info.name,
            metadata: if metadata.is_empty() {
                None
            } else {
                Some(serde_json::Value::Object(metadata))
            },
        }
    }
}

#[async_trait]
impl IdentityBackend for OAuth2Backend {
    async fn wait_ready(&self) -> AuthResult<()> {
        // The in-process backend knows its state as soon as it is built;
        // any persisted session was handed in at construction.
        Ok(())
    }

    async fn current_user(&self) -> Option<AuthUser> {
        self.session.read().await.clone()
    }

    async fn sign_out(&self) -> AuthResult<()> {
        *self.session.write().await = None;
        info!("Signed out");
        Ok(())
    }

    async fn sign_in_with_redirect(&self, provider_id: &str) -> AuthResult<()> {
        let provider_config = self.get_provider_config(provider_id)?;

        let listener = CallbackListener::bind(
            &self.config.callback_host,
            self.config.callback_port,
            &self.config.callback_path,
        )
        .await?;
        let redirect_uri = listener.redirect_uri().to_string();

        let (auth_url, _state) = self
            .client
            .generate_authorization_url(provider_config, &redirect_uri)
            .await?;

        info!("Started sign-in flow for provider: {}", provider_id);
        self.opener.open(&auth_url)?;

        // Suspends until the provider redirects back. No timeout.
        let callback = listener.recv().await?;

        *self.pending.lock().await = Some(PendingCallback {
            provider_id: provider_id.to_string(),
            callback,
        });

        Ok(())
    }

    async fn redirect_result(&self) -> AuthResult<Option<AuthUser>> {
        let Some(pending) = self.pending.lock().await.take() else {
            return Ok(None);
        };

        let provider_config = self.get_provider_config(&pending.provider_id)?;

        let token_response = self
            .client
            .handle_callback(provider_config, pending.callback)
            .await?;

        let user_info = self
            .client
            .get_user_info(provider_config, &token_response.access_token)
            .await?;

        let user = Self::map_user_info(&pending.provider_id, user_info);
        *self.session.write().await = Some(user.clone());

        info!("Resolved sign-in for provider: {}", pending.provider_id);
        Ok(Some(user))
    }
}
