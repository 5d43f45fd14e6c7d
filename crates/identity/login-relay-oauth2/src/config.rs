//! OAuth2 configuration types.

use crate::error::{OAuth2Error, OAuth2Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static settings for one identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2ProviderConfig {
    pub provider_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: Option<String>,
    pub scopes: Vec<String>,
    /// Additional parameters to include in the authorization request
    pub auth_params: HashMap<String, String>,
    /// Whether to use PKCE (recommended for public clients)
    pub use_pkce: bool,
}

impl OAuth2ProviderConfig {
    /// Google with its published endpoints and the openid/email/profile
    /// scopes.
    pub fn google(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            provider_id: "google".to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_endpoint: Some("https://www.googleapis.com/oauth2/v3/userinfo".to_string()),
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
            auth_params: HashMap::new(),
            use_pkce: true,
        }
    }

    /// Google settings from `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`.
    pub fn google_from_env() -> OAuth2Result<Self> {
        let client_id = std::env::var("GOOGLE_CLIENT_ID").map_err(|_| {
            OAuth2Error::ConfigError("GOOGLE_CLIENT_ID environment variable is required".into())
        })?;
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET").map_err(|_| {
            OAuth2Error::ConfigError("GOOGLE_CLIENT_SECRET environment variable is required".into())
        })?;
        Ok(Self::google(client_id, client_secret))
    }
}

/// Backend-wide configuration: the provider registry plus the loopback
/// listener and flow settings.
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    pub providers: HashMap<String, OAuth2ProviderConfig>,
    /// Host the callback listener binds to.
    pub callback_host: String,
    /// Port for the callback listener; 0 picks an ephemeral port.
    pub callback_port: u16,
    pub callback_path: String,
    pub state_ttl_seconds: u64,
    /// Bounds token and userinfo requests only. Waiting for the user to
    /// finish consenting is unbounded.
    pub http_timeout_seconds: u64,
}

impl Default for OAuth2Config {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            callback_host: "127.0.0.1".to_string(),
            callback_port: 0,
            callback_path: "/auth/callback".to_string(),
            state_ttl_seconds: 600, // 10 minutes
            http_timeout_seconds: 30,
        }
    }
}

impl OAuth2Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_provider(mut self, config: OAuth2ProviderConfig) -> Self {
        self.providers.insert(config.provider_id.clone(), config);
        self
    }

    pub fn with_callback_port(mut self, port: u16) -> Self {
        self.callback_port = port;
        self
    }

    pub fn with_state_ttl(mut self, seconds: u64) -> Self {
        self.state_ttl_seconds = seconds;
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = seconds;
        self
    }
}
