//! OAuth2 backend for redirect-based sign-in.
//!
//! This crate realizes the [`login_relay_core::IdentityBackend`] seam with
//! the OAuth2 Authorization Code flow (PKCE by default). The browser's
//! navigation round trip is replaced by a loopback callback listener: the
//! authorization URL is handed to a pluggable [`UrlOpener`], and a local
//! HTTP listener receives the provider's redirect.

mod backend;
mod client;
mod config;
mod error;
mod listener;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use backend::{LogOpener, OAuth2Backend, UrlOpener};
pub use client::{OAuth2Client, PkceChallenge};
pub use config::{OAuth2Config, OAuth2ProviderConfig};
pub use error::{OAuth2Error, OAuth2Result};
pub use listener::CallbackListener;
pub use state::{InMemoryLoginStore, LoginStateStore, PendingLogin};
pub use types::{AuthorizationCallback, TokenResponse, UserInfoResponse};

// Re-export the seam types for convenience
pub use login_relay_core::{AuthUser, IdentityBackend};
