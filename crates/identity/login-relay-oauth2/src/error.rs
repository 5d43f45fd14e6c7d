//! OAuth2 error types.

use login_relay_core::AuthError;
use thiserror::Error;

pub type OAuth2Result<T> = Result<T, OAuth2Error>;

#[derive(Debug, Error)]
pub enum OAuth2Error {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Login state not found or expired")]
    StateNotFound,

    #[error("State parameter mismatch")]
    InvalidState,

    #[error("Callback error: {0}")]
    CallbackError(String),

    #[error("Callback listener error: {0}")]
    ListenerError(String),

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("User info request failed: {0}")]
    UserInfoFailed(String),

    #[error("Invalid user info response: {0}")]
    InvalidUserInfoResponse(String),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<OAuth2Error> for AuthError {
    fn from(err: OAuth2Error) -> Self {
        match err {
            // Carries the bare provider id so the message is not nested
            OAuth2Error::ProviderNotFound(provider_id) => {
                AuthError::ProviderNotConfigured(provider_id)
            }
            other => AuthError::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_converts_to_a_flat_message() {
        let err: AuthError = OAuth2Error::ProviderNotFound("github".to_string()).into();
        assert_eq!(err.to_string(), "Provider not configured: github");
    }

    #[test]
    fn general_config_errors_stay_backend_errors() {
        let err: AuthError =
            OAuth2Error::ConfigError("User info endpoint not configured".to_string()).into();
        assert!(matches!(err, AuthError::Backend(_)));
        assert_eq!(
            err.to_string(),
            "Backend error: Invalid configuration: User info endpoint not configured"
        );
    }
}
