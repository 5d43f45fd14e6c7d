//! End-to-end Google sign-in from the terminal.
//!
//! Reads GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET (a `.env` file works),
//! logs an authorization URL to open in a browser, waits for Google to
//! redirect back to the loopback listener, and prints the outcome.

use anyhow::Result;
use login_relay::{AuthAdapter, LoginOutcome};
use login_relay_oauth2::{OAuth2Backend, OAuth2Config, OAuth2ProviderConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let _ = dotenvy::dotenv();

    let config = OAuth2Config::new()
        .add_provider(OAuth2ProviderConfig::google_from_env()?)
        .with_state_ttl(600)
        .with_http_timeout(30);

    let backend = Arc::new(OAuth2Backend::new(config));
    let adapter = AuthAdapter::connect(backend).await?;

    println!("Starting Google sign-in; follow the URL from the log line above.");

    match adapter.attempt_login("google").await? {
        LoginOutcome::Success(user) => {
            println!("Signed in as {} ({:?})", user.subject, user.email);
            println!("Current user: {:?}", adapter.current_user().await);

            adapter.sign_out().await?;
            println!("Signed out; current user: {:?}", adapter.current_user().await);
        }
        LoginOutcome::Failed => {
            println!("Login failed: the redirect completed without a session.");
        }
        LoginOutcome::UnsupportedProvider => {
            println!("No provider wired for that selector.");
        }
    }

    Ok(())
}
