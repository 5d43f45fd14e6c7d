//! Core types and the backend seam for redirect-based sign-in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Backend not ready")]
    NotReady,

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// The signed-in user as reported by the identity backend.
///
/// Adapters treat this as a read-only pass-through record; only backends
/// construct it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub provider_id: String,
    pub subject: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// The external identity collaborator behind the adapter.
///
/// A redirect-based sign-in happens in two phases: `sign_in_with_redirect`
/// sends the user to the provider's consent page and returns once the
/// provider has redirected back, and `redirect_result` resolves that
/// round trip into a session. None of these operations carry a timeout;
/// a backend that never settles stalls its caller.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Resolves once the backend knows its initial session state.
    async fn wait_ready(&self) -> AuthResult<()>;

    /// The active session's user, if any. Pure read, no side effects.
    async fn current_user(&self) -> Option<AuthUser>;

    /// Terminates the active session. Afterwards `current_user` reports
    /// `None`.
    async fn sign_out(&self) -> AuthResult<()>;

    /// Initiates the consent round trip for the named provider and returns
    /// when the provider has redirected back to us.
    async fn sign_in_with_redirect(&self, provider_id: &str) -> AuthResult<()>;

    /// Resolves the outcome of the last completed redirect. `None` when no
    /// redirect is pending.
    async fn redirect_result(&self) -> AuthResult<Option<AuthUser>>;
}
