//! Provider-agnostic sign-in adapter.
//!
//! [`AuthAdapter`] owns a handle to one [`IdentityBackend`] and exposes the
//! three operations an application needs: read the current user, sign out,
//! and run a redirect-based login for a named provider. The adapter is
//! deliberately thin; everything protocol-shaped lives behind the backend
//! seam.

use std::sync::Arc;
use tracing::warn;

// Re-export the seam types for convenience
pub use login_relay_core::{AuthError, AuthResult, AuthUser, IdentityBackend};

/// Outcome of a login attempt. Callers branch on this instead of wiring a
/// success callback.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// The redirect round trip produced a session.
    Success(AuthUser),
    /// The round trip completed but no session resulted.
    Failed,
    /// The selector named no known provider. Not an error; nothing was
    /// attempted.
    UnsupportedProvider,
}

/// Maps a provider selector string to the backend's provider id.
fn resolve_provider(how: &str) -> Option<&'static str> {
    match how {
        "google" => Some("google"),
        // TODO: "github" once a GitHub app registration exists
        _ => None,
    }
}

/// Adapter over a single identity backend. One adapter, one backend, one
/// session: all operations act on the same injected handle.
pub struct AuthAdapter {
    backend: Arc<dyn IdentityBackend>,
}

impl AuthAdapter {
    /// Builds the adapter once the backend's initial session state is known.
    /// No adapter value exists before that point, and there is no timeout on
    /// the wait.
    pub async fn connect(backend: Arc<dyn IdentityBackend>) -> AuthResult<Self> {
        backend.wait_ready().await?;
        Ok(Self { backend })
    }

    /// The current session's user, or `None` when signed out. Straight
    /// pass-through of the backend's state.
    pub async fn current_user(&self) -> Option<AuthUser> {
        self.backend.current_user().await
    }

    /// Ends the active session. Backend failures propagate to the caller.
    pub async fn sign_out(&self) -> AuthResult<()> {
        self.backend.sign_out().await
    }

    /// Runs a redirect-based login for the given selector.
    ///
    /// Unrecognized selectors log a diagnostic and return
    /// [`LoginOutcome::UnsupportedProvider`] without touching the backend.
    /// Otherwise the flow is sequential: initiate the redirect, resolve its
    /// result, then inspect whether a session now exists. Backend errors
    /// from either step propagate uncaught.
    pub async fn attempt_login(&self, how: &str) -> AuthResult<LoginOutcome> {
        let Some(provider_id) = resolve_provider(how) else {
            warn!(selector = %how, "No identity provider for selector");
            return Ok(LoginOutcome::UnsupportedProvider);
        };

        self.backend.sign_in_with_redirect(provider_id).await?;
        self.backend.redirect_result().await?;

        match self.backend.current_user().await {
            Some(user) => Ok(LoginOutcome::Success(user)),
            None => {
                warn!("Login failed: redirect completed without a session");
                Ok(LoginOutcome::Failed)
            }
        }
    }
}
