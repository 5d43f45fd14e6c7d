//! OAuth2 wire types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Query parameters delivered by the provider's redirect to the callback
/// listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCallback {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub state: String,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// OAuth2 token endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

/// OAuth2 user info response (OpenID Connect compatible)
///
/// Supports both the OpenID Connect field names and legacy providers:
/// `sub` (standard) or `id` (Google OAuth2 v1) for the user identifier.
/// Claims outside the known set are captured in `additional_claims`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfoResponse {
    #[serde(alias = "id")]
    pub sub: String,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
    pub locale: Option<String>,
    #[serde(flatten)]
    pub additional_claims: HashMap<String, serde_json::Value>,
}
