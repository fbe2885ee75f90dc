// Discord layer - DM handling, interactive components, connect notifications.

#[path = "handler.rs"]
pub mod handler;

#[path = "notifier.rs"]
pub mod notifier;

#[path = "ui.rs"]
pub mod ui;

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;

use crate::core::agent::AgentService;
use crate::core::auth::AuthService;
use crate::infra::ai::AnthropicClient;
use crate::infra::auth::{FileCredentialStore, GoogleOAuthClient};

pub type AuthManager = AuthService<FileCredentialStore, GoogleOAuthClient>;
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Shared state available to every event handler invocation.
pub struct Data {
    pub auth: Arc<AuthManager>,
    pub agent: Arc<AgentService<AnthropicClient>>,
    /// Interactive components waiting for the user's next click, keyed by
    /// user id. One slot per user; a new picker or form replaces the old one.
    pub pending_ui: DashMap<String, ui::PendingUi>,
    /// Empty set means every user is allowed.
    pub allowed_users: HashSet<u64>,
}
