pub mod auth_service;
pub mod identity;

pub use auth_service::{
    AccessTokenProvider, AuthError, AuthService, CredentialStore, TokenEndpoint, UserCredentials,
    SCOPES,
};
