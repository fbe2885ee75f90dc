// =============================================================================
// OAUTH CALLBACK SERVER
// =============================================================================
//
// A single-route axum server that receives Google's redirect after the user
// approves (or denies) the consent screen. The `state` query parameter is the
// Discord user id the consent URL was built for; it ties the one-time code
// back to the user whose credentials get stored.
//
// Known gap: `state` is the plaintext user id with no signature, so anyone
// who can reach this port could submit a code under an arbitrary id. The bot
// runs on a private host behind a tunnel for one or a handful of trusted
// users, which keeps this acceptable.

use std::error::Error;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::core::auth::{AuthError, AuthService, CredentialStore, TokenEndpoint};
use async_trait::async_trait;

/// The slice of the auth service the callback needs.
#[async_trait]
pub trait CodeExchanger: Send + Sync {
    async fn exchange_code(&self, user_id: &str, code: &str) -> Result<(), AuthError>;
}

#[async_trait]
impl<S: CredentialStore, T: TokenEndpoint> CodeExchanger for AuthService<S, T> {
    async fn exchange_code(&self, user_id: &str, code: &str) -> Result<(), AuthError> {
        AuthService::exchange_code(self, user_id, code).await?;
        Ok(())
    }
}

/// Tells the user on Discord that their account got connected. Best-effort:
/// a failed DM never turns a successful exchange into an error page.
#[async_trait]
pub trait ConnectNotifier: Send + Sync {
    async fn notify_connected(&self, user_id: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
}

#[derive(Clone)]
pub struct CallbackState {
    pub exchanger: Arc<dyn CodeExchanger>,
    pub notifier: Arc<dyn ConnectNotifier>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    /// Set by Google when the user cancels the consent screen.
    #[serde(default)]
    error: Option<String>,
}

pub fn router(state: CallbackState) -> Router {
    Router::new()
        .route("/oauth/callback", get(oauth_callback))
        .with_state(state)
}

/// Binds the callback server and runs it until the process exits.
pub async fn serve(state: CallbackState, port: u16) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("OAuth callback server listening on port {}", port);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn oauth_callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<String>) {
    if let Some(error) = params.error {
        tracing::warn!("OAuth consent denied or failed: {}", error);
        return (StatusCode::BAD_REQUEST, cancelled_page());
    }

    let (Some(code), Some(user_id)) = (params.code, params.state) else {
        tracing::warn!("OAuth callback missing code or state");
        return (StatusCode::BAD_REQUEST, cancelled_page());
    };

    if let Err(e) = state.exchanger.exchange_code(&user_id, &code).await {
        tracing::error!("Code exchange failed for user {}: {}", user_id, e);
        return (StatusCode::INTERNAL_SERVER_ERROR, failure_page(&e));
    }

    tracing::info!("Google account connected for user {}", user_id);

    if let Err(e) = state.notifier.notify_connected(&user_id).await {
        tracing::warn!("Could not DM user {} after connect: {}", user_id, e);
    }

    (StatusCode::OK, success_page())
}

fn page(heading: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html><html><head><title>Docs Agent</title></head>\
         <body style=\"font-family: sans-serif; text-align: center; margin-top: 4em;\">\
         <h1>{heading}</h1><p>{body}</p></body></html>"
    ))
}

fn success_page() -> Html<String> {
    page(
        "✅ Connected",
        "Your Google account is linked. You can close this tab and return to Discord.",
    )
}

fn cancelled_page() -> Html<String> {
    page(
        "Authorization cancelled",
        "No changes were made. Message the bot again if you want to retry.",
    )
}

fn failure_page(error: &AuthError) -> Html<String> {
    page(
        "Something went wrong",
        &format!("The authorization could not be completed: {error}"),
    )
}
