// Google OAuth2 web-application client: consent URL construction plus the
// code-for-token and refresh-token exchanges.
//
// Secrets come from the "Web application" client JSON downloaded from Google
// Cloud Console (APIs & Services → Credentials). Default path is
// `credentials.json` in the working directory; override with
// GOOGLE_CLIENT_SECRETS_FILE. The redirect URI must match one registered on
// the client (e.g. https://your-tunnel.trycloudflare.com/oauth/callback).

use std::error::Error;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::core::auth::{AuthError, TokenEndpoint, UserCredentials, SCOPES};

/// Client secrets JSON as exported by the Cloud Console ("web" key).
#[derive(Debug, Clone, Deserialize)]
struct ClientSecretsFile {
    web: ClientSecrets,
}

#[derive(Debug, Clone, Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: String,
    #[serde(default = "default_auth_uri")]
    auth_uri: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Response from Google's token endpoint, for both grant types.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Space-separated scope list; absent on refresh responses.
    #[serde(default)]
    scope: Option<String>,
}

pub struct GoogleOAuthClient {
    secrets: ClientSecrets,
    auth_uri: Url,
    redirect_uri: String,
    client: Client,
}

impl GoogleOAuthClient {
    /// Creates a client from JSON content.
    pub fn from_json(json: &str, redirect_uri: String) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let file: ClientSecretsFile = serde_json::from_str(json)?;
        let auth_uri = Url::parse(&file.web.auth_uri)?;
        Ok(Self {
            secrets: file.web,
            auth_uri,
            redirect_uri,
            client: Client::new(),
        })
    }

    /// Creates a client from a JSON key file path.
    pub async fn from_file(
        path: &str,
        redirect_uri: String,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content, redirect_uri)
    }

    /// Creates from environment variables: GOOGLE_CLIENT_SECRETS_FILE
    /// (default `credentials.json`) and OAUTH_REDIRECT_URI (required).
    pub async fn from_env() -> Result<Self, Box<dyn Error + Send + Sync>> {
        let path = std::env::var("GOOGLE_CLIENT_SECRETS_FILE")
            .unwrap_or_else(|_| "credentials.json".to_string());
        let redirect_uri = std::env::var("OAUTH_REDIRECT_URI")
            .map_err(|_| "OAUTH_REDIRECT_URI is not set")?;
        Self::from_file(&path, redirect_uri).await
    }

    fn credentials_from(
        &self,
        token: TokenResponse,
        fallback_refresh: Option<String>,
    ) -> UserCredentials {
        UserCredentials {
            access_token: token.access_token,
            // Refresh responses omit the refresh token; keep the one we had.
            refresh_token: token.refresh_token.or(fallback_refresh),
            expiry: Utc::now() + Duration::seconds(token.expires_in.unwrap_or(3600)),
            scopes: match token.scope {
                Some(scope) => scope.split_whitespace().map(|s| s.to_string()).collect(),
                None => SCOPES.iter().map(|s| s.to_string()).collect(),
            },
        }
    }
}

#[async_trait]
impl TokenEndpoint for GoogleOAuthClient {
    /// Builds the consent URL for one user.
    ///
    /// `prompt=consent` forces Google to always show the consent screen,
    /// which guarantees a refresh_token in the exchange response. Without it
    /// Google only issues a refresh token on the very first authorisation,
    /// so a user who revoked and re-connected would end up with a token that
    /// dies after an hour with no way to renew it silently.
    fn consent_url(&self, user_id: &str) -> String {
        let scopes = SCOPES.join(" ");
        let mut url = self.auth_uri.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.secrets.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &scopes)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("state", user_id);
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<UserCredentials, AuthError> {
        let response = self
            .client
            .post(&self.secrets.token_uri)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", &self.redirect_uri),
                ("client_id", &self.secrets.client_id),
                ("client_secret", &self.secrets.client_secret),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::Exchange(format!("{status}: {text}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;
        Ok(self.credentials_from(token, None))
    }

    async fn refresh(&self, creds: &UserCredentials) -> Result<UserCredentials, AuthError> {
        let refresh_token = creds
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::Refresh("no refresh token stored".to_string()))?;

        let response = self
            .client
            .post(&self.secrets.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &self.secrets.client_id),
                ("client_secret", &self.secrets.client_secret),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Refresh(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::Refresh(format!("{status}: {text}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Refresh(e.to_string()))?;
        Ok(self.credentials_from(token, creds.refresh_token.clone()))
    }
}
