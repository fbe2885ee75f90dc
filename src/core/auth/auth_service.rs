// Per-user Google OAuth2 credential lifecycle.
//
// The flow, end to end:
// 1. A user DMs the bot for the first time.
// 2. The handler finds no stored credentials and replies with a consent link
//    built by `AuthService::consent_url` (user id rides along as `state`).
// 3. The user approves in a browser; Google redirects to our callback with a
//    one-time `code` and the echoed `state`.
// 4. The callback calls `AuthService::exchange_code`, which swaps the code
//    for tokens and persists them.
// 5. Later requests resolve credentials through `credentials()`, which
//    refreshes expired tokens transparently when a refresh token exists.
//
// Token files are plain JSON, one per Discord user id, in a directory that is
// volume-mounted in Docker so they survive restarts. Do not commit them;
// they grant full Docs/Drive access to the user's account.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::identity;

/// Both scopes are requested together in one OAuth grant so the user only has
/// to click through the consent screen once. Changing this list requires
/// users to re-authorise (existing tokens will lack the new scope and Google
/// returns 403); delete their token file to force the flow again.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/documents",
    "https://www.googleapis.com/auth/drive",
];

/// Errors raised by the credential lifecycle.
///
/// `NotConnected` and `ReauthRequired` carry user-facing remediation text so
/// the agent can relay them verbatim.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Google account not connected. Send me any message and click 'Connect Google'.")]
    NotConnected,
    #[error("Google access has expired and can't be renewed silently. Please reconnect your Google account.")]
    ReauthRequired,
    #[error("Token exchange failed: {0}")]
    Exchange(String),
    #[error("Token refresh failed: {0}")]
    Refresh(String),
    #[error("Credential store error: {0}")]
    Store(String),
}

/// One user's delegated access grant, as persisted on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCredentials {
    pub access_token: String,
    /// Absent means the grant cannot be renewed silently; once expired, the
    /// user has to run the consent flow again.
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expiry: DateTime<Utc>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl UserCredentials {
    /// Treats tokens within 30 seconds of expiry as already expired so a
    /// token can't lapse in the middle of an API call.
    pub fn is_expired(&self) -> bool {
        self.expiry <= Utc::now() + Duration::seconds(30)
    }

    pub fn is_renewable(&self) -> bool {
        self.refresh_token.is_some()
    }
}

/// Durable per-user credential storage. Presence-only `exists`; `load` does
/// not validate freshness; that is `AuthService::credentials`' job.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn exists(&self, user_id: &str) -> bool;
    async fn load(&self, user_id: &str) -> Result<Option<UserCredentials>, AuthError>;
    async fn save(&self, user_id: &str, creds: &UserCredentials) -> Result<(), AuthError>;
}

/// The upstream authorization service: consent URL construction plus the two
/// network exchanges (one-time code, refresh token).
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Pure function of configuration and input, no side effects.
    fn consent_url(&self, user_id: &str) -> String;

    /// Swaps a one-time authorization code for tokens. Codes are single-use
    /// and short-lived (minutes); a reused code fails here.
    async fn exchange_code(&self, code: &str) -> Result<UserCredentials, AuthError>;

    /// Renews an expired grant using its refresh token.
    async fn refresh(&self, creds: &UserCredentials) -> Result<UserCredentials, AuthError>;
}

/// Resolves a bearer token for the identity currently bound via
/// [`identity::bind`]. Implemented by `AuthService`; the Google API clients
/// depend on this trait only.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// Coordinates the authorization flow over an injected store and endpoint.
pub struct AuthService<S, T> {
    store: S,
    endpoint: T,
}

impl<S: CredentialStore, T: TokenEndpoint> AuthService<S, T> {
    pub fn new(store: S, endpoint: T) -> Self {
        Self { store, endpoint }
    }

    /// True if a credential file exists for this user. Presence only; the
    /// stored record may still be expired or lack scopes.
    pub async fn is_authenticated(&self, user_id: &str) -> bool {
        self.store.exists(user_id).await
    }

    /// Builds the consent URL for this user. The user id is embedded as the
    /// `state` parameter; Google echoes it back verbatim on the callback so
    /// the server knows whose tokens to store without any session storage.
    pub fn consent_url(&self, user_id: &str) -> String {
        let url = self.endpoint.consent_url(user_id);
        tracing::info!("Auth URL generated for user {}", user_id);
        url
    }

    /// Exchanges a one-time authorization code, persists the result, and
    /// returns it. A save failure after a successful exchange propagates:
    /// the user will look unauthenticated on the next `exists` check and
    /// has to re-run the flow.
    pub async fn exchange_code(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<UserCredentials, AuthError> {
        let creds = self.endpoint.exchange_code(code).await?;
        self.store.save(user_id, &creds).await?;
        tracing::info!("Code exchanged successfully for user {}", user_id);
        Ok(creds)
    }

    /// Loads credentials, refreshing transparently when expired and
    /// renewable. The renewed record is persisted so the next call doesn't
    /// hit the token endpoint again. An expired record with no refresh token
    /// is returned as-is; the caller must check `is_expired` and surface a
    /// re-authorization requirement.
    pub async fn credentials(&self, user_id: &str) -> Result<Option<UserCredentials>, AuthError> {
        let Some(creds) = self.store.load(user_id).await? else {
            return Ok(None);
        };

        if creds.is_expired() && creds.is_renewable() {
            tracing::info!("Refreshing expired token for user {}", user_id);
            let renewed = self.endpoint.refresh(&creds).await?;
            self.store.save(user_id, &renewed).await?;
            return Ok(Some(renewed));
        }

        Ok(Some(creds))
    }

    pub async fn save(&self, user_id: &str, creds: &UserCredentials) -> Result<(), AuthError> {
        self.store.save(user_id, creds).await?;
        tracing::info!("Credentials saved for user {}", user_id);
        Ok(())
    }
}

#[async_trait]
impl<S: CredentialStore, T: TokenEndpoint> AccessTokenProvider for AuthService<S, T> {
    async fn access_token(&self) -> Result<String, AuthError> {
        let user_id = identity::current();
        if user_id.is_empty() {
            return Err(AuthError::NotConnected);
        }

        match self.credentials(&user_id).await? {
            None => Err(AuthError::NotConnected),
            Some(creds) if creds.is_expired() => Err(AuthError::ReauthRequired),
            Some(creds) => Ok(creds.access_token),
        }
    }
}
