//! Integration tests for the OAuth2 backend against mocked provider
//! endpoints. The "browser" leg of the flow is played by an opener that
//! issues the provider redirect against the loopback listener itself.

use crate::backend::{OAuth2Backend, UrlOpener};
use crate::config::{OAuth2Config, OAuth2ProviderConfig};
use crate::error::OAuth2Result;
use login_relay_core::IdentityBackend;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_provider_config(server_uri: &str) -> OAuth2ProviderConfig {
    OAuth2ProviderConfig {
        provider_id: "mock_provider".to_string(),
        client_id: "mock_client_id".to_string(),
        client_secret: "mock_secret".to_string(),
        authorization_endpoint: format!("{}/authorize", server_uri),
        token_endpoint: format!("{}/token", server_uri),
        userinfo_endpoint: Some(format!("{}/userinfo", server_uri)),
        scopes: vec!["openid".to_string(), "email".to_string()],
        auth_params: HashMap::new(),
        use_pkce: true,
    }
}

/// Follows the authorization URL the way a provider would end it: by
/// redirecting straight back to the loopback listener.
fn redirecting_opener(extra_params: &'static str) -> Arc<dyn UrlOpener> {
    Arc::new(move |auth_url: &str| -> OAuth2Result<()> {
        let url = Url::parse(auth_url).expect("authorization URL must parse");
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
        let redirect_uri = params["redirect_uri"].clone();
        let state = params["state"].clone();

        tokio::spawn(async move {
            let callback_url = format!("{}?state={}&{}", redirect_uri, state, extra_params);
            let _ = reqwest::get(&callback_url).await;
        });

        Ok(())
    })
}

#[tokio::test]
async fn full_redirect_login_installs_a_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=mock_auth_code"))
        .and(body_string_contains("code_verifier"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "mock_access_token",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "mock_refresh_token",
            "scope": "openid email"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .and(header("Authorization", "Bearer mock_access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sub": "12345",
            "email": "test@example.com",
            "email_verified": true,
            "name": "Test User",
            "picture": "https://example.com/photo.jpg"
        })))
        .mount(&mock_server)
        .await;

    let config = OAuth2Config::new().add_provider(mock_provider_config(&mock_server.uri()));
    let backend =
        OAuth2Backend::new(config).with_opener(redirecting_opener("code=mock_auth_code"));

    backend.sign_in_with_redirect("mock_provider").await.unwrap();

    let resolved = backend.redirect_result().await.unwrap();
    let user = resolved.expect("redirect result must yield a user");
    assert_eq!(user.provider_id, "mock_provider");
    assert_eq!(user.subject, "12345");
    assert_eq!(user.email, Some("test@example.com".to_string()));
    assert_eq!(user.display_name, Some("Test User".to_string()));

    let current = backend.current_user().await.expect("session must be live");
    assert_eq!(current, user);

    backend.sign_out().await.unwrap();
    assert!(backend.current_user().await.is_none());
}

#[tokio::test]
async fn denied_consent_surfaces_as_an_error_and_no_session() {
    let mock_server = MockServer::start().await;

    let config = OAuth2Config::new().add_provider(mock_provider_config(&mock_server.uri()));
    let backend =
        OAuth2Backend::new(config).with_opener(redirecting_opener("error=access_denied"));

    backend.sign_in_with_redirect("mock_provider").await.unwrap();

    let result = backend.redirect_result().await;
    assert!(result.is_err());
    assert!(backend.current_user().await.is_none());
}

#[tokio::test]
async fn failed_token_exchange_leaves_no_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "The provided authorization code is invalid"
        })))
        .mount(&mock_server)
        .await;

    let config = OAuth2Config::new().add_provider(mock_provider_config(&mock_server.uri()));
    let backend = OAuth2Backend::new(config).with_opener(redirecting_opener("code=bad_code"));

    backend.sign_in_with_redirect("mock_provider").await.unwrap();

    let result = backend.redirect_result().await;
    assert!(result.is_err());
    assert!(backend.current_user().await.is_none());
}

#[tokio::test]
async fn concurrent_flows_get_unique_state_parameters() {
    use crate::client::OAuth2Client;
    use crate::state::InMemoryLoginStore;

    let state_store = Arc::new(InMemoryLoginStore::new());
    let client = OAuth2Client::new(state_store, 600, 30);
    let provider_config = mock_provider_config("https://example.com");

    let mut handles = vec![];
    for _ in 0..10 {
        let client = client.clone();
        let config = provider_config.clone();
        handles.push(tokio::spawn(async move {
            client
                .generate_authorization_url(&config, "http://127.0.0.1:9/cb")
                .await
        }));
    }

    let mut states = vec![];
    for handle in handles {
        let (_, state) = handle.await.unwrap().unwrap();
        states.push(state);
    }

    let unique: std::collections::HashSet<_> = states.iter().collect();
    assert_eq!(unique.len(), states.len());
}
