//! Loopback HTTP listener for the provider redirect.
//!
//! Each login attempt binds its own listener, serves exactly one callback
//! request, and shuts down once the redirect has landed.

use crate::error::{OAuth2Error, OAuth2Result};
use crate::types::AuthorizationCallback;
use axum::{Router, extract::Query, extract::State, response::Html, routing::get};
use std::sync::Arc;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, warn};

type CallbackSlot = Arc<Mutex<Option<oneshot::Sender<AuthorizationCallback>>>>;

const COMPLETE_PAGE: &str = "\
<!DOCTYPE html>
<html>
<head><title>Sign-in complete</title></head>
<body>
    <h1>Sign-in complete</h1>
    <p>You can close this window and return to the application.</p>
</body>
</html>";

const DENIED_PAGE: &str = "\
<!DOCTYPE html>
<html>
<head><title>Sign-in not completed</title></head>
<body>
    <h1>Sign-in not completed</h1>
    <p>The identity provider reported an error. You can close this window.</p>
</body>
</html>";

/// A one-shot callback listener bound to the loopback interface.
pub struct CallbackListener {
    redirect_uri: String,
    rx: oneshot::Receiver<AuthorizationCallback>,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl CallbackListener {
    /// Bind the listener. Port 0 picks an ephemeral port; the effective
    /// redirect URI is available afterwards via [`redirect_uri`].
    ///
    /// [`redirect_uri`]: CallbackListener::redirect_uri
    pub async fn bind(host: &str, port: u16, path: &str) -> OAuth2Result<Self> {
        let listener = tokio::net::TcpListener::bind((host, port))
            .await
            .map_err(|e| OAuth2Error::ListenerError(e.to_string()))?;
        let addr = listener
            .local_addr()
            .map_err(|e| OAuth2Error::ListenerError(e.to_string()))?;

        let (tx, rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let slot: CallbackSlot = Arc::new(Mutex::new(Some(tx)));

        let app = Router::new()
            .route(path, get(callback_handler))
            .with_state(slot);

        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(err) = serve.await {
                error!("Callback listener failed: {}", err);
            }
        });

        Ok(Self {
            redirect_uri: format!("http://{}{}", addr, path),
            rx,
            shutdown_tx,
            handle,
        })
    }

    /// The redirect URI the provider must send the user back to.
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Wait for the provider redirect, then shut the listener down. There is
    /// no timeout; an abandoned consent page stalls the caller.
    pub async fn recv(self) -> OAuth2Result<AuthorizationCallback> {
        let callback = self.rx.await.map_err(|_| {
            OAuth2Error::ListenerError("listener closed before a redirect arrived".to_string())
        })?;

        // Let the in-flight response finish before tearing the server down.
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;

        Ok(callback)
    }
}

async fn callback_handler(
    State(slot): State<CallbackSlot>,
    Query(callback): Query<AuthorizationCallback>,
) -> Html<&'static str> {
    let denied = callback.error.is_some();

    if let Some(tx) = slot.lock().await.take() {
        let _ = tx.send(callback);
    } else {
        warn!("Ignoring repeated callback request");
    }

    if denied {
        Html(DENIED_PAGE)
    } else {
        Html(COMPLETE_PAGE)
    }
}
