// This is the entry point of the Docs agent bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (auth flow, agent loop, tools)
// - `infra/` = Implementations of core traits (Google APIs, Anthropic, files)
// - `discord/` = Discord-specific adapters (DM handling, components)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework and the OAuth callback server
// 4. Run both until one of them dies

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::agent::AgentService;
use crate::core::auth::{AccessTokenProvider, AuthService};
use crate::core::tools::default_toolset;
use crate::discord::handler::{event_handler, parse_allow_list};
use crate::discord::notifier::DiscordConnectNotifier;
use crate::discord::{Data, Error};
use crate::infra::ai::AnthropicClient;
use crate::infra::auth::{FileCredentialStore, GoogleOAuthClient};
use crate::infra::google::{GoogleDocsClient, GoogleDriveClient};
use crate::infra::http::{self, CallbackState};
use dashmap::DashMap;
use poise::serenity_prelude as serenity;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_CALLBACK_PORT: u16 = 8080;

const SYSTEM_PROMPT: &str = "\
You are a personal assistant that manages the user's Google Docs over Discord.

Rules:
- Never ask the user to type out a document ID. When you need the user to \
pick a document, call show_document_picker and wait for their selection.
- When you need several pieces of input at once (like a title and a body), \
call request_form instead of asking question by question.
- Confirm with the user before creating, overwriting, or deleting a document.
- Keep replies short; this is a chat, not an email thread.
- If something fails, say what went wrong in plain language and suggest what \
the user can do about it.";

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let token = std::env::var("DISCORD_BOT_TOKEN").expect(
        "Missing DISCORD_BOT_TOKEN environment variable! Create a .env file with your bot token.",
    );

    // Keep runtime state in a dedicated folder so the repo root stays tidy.
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let tokens_dir = PathBuf::from(&data_dir).join("tokens");
    let workspace_dir = std::env::var("WORKSPACE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(&data_dir).join("workspace"));
    let diary_doc_id = std::env::var("GOOGLE_DIARY_DOC_ID").ok();

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let oauth = GoogleOAuthClient::from_env()
        .await
        .expect("Failed to load Google OAuth client secrets");
    let auth = Arc::new(AuthService::new(
        FileCredentialStore::new(&tokens_dir),
        oauth,
    ));

    // The Google clients resolve tokens for whichever user is bound when a
    // tool runs, so one client pair serves every user.
    let tokens: Arc<dyn AccessTokenProvider> = auth.clone();
    let docs = Arc::new(GoogleDocsClient::new(tokens.clone()));
    let drive = Arc::new(GoogleDriveClient::new(tokens));

    let api_key = std::env::var("ANTHROPIC_API_KEY")
        .expect("Missing ANTHROPIC_API_KEY environment variable!");
    let model =
        std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    let chat_model = AnthropicClient::new(api_key, model);

    let tools = default_toolset(docs, drive, workspace_dir, diary_doc_id);
    let agent = Arc::new(AgentService::new(
        chat_model,
        tools,
        SYSTEM_PROMPT.to_string(),
    ));

    let allowed_users = parse_allow_list(
        &std::env::var("ALLOWED_DISCORD_USER_IDS").unwrap_or_default(),
    );
    if allowed_users.is_empty() {
        tracing::warn!("ALLOWED_DISCORD_USER_IDS is not set; every Discord user is allowed");
    }

    let data = Data {
        auth: Arc::clone(&auth),
        agent: Arc::clone(&agent),
        pending_ui: DashMap::new(),
        allowed_users,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents =
        serenity::GatewayIntents::DIRECT_MESSAGES | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Everything happens through DMs and components, no slash commands.
            commands: vec![],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|_ctx, _ready, _framework| {
            Box::pin(async move {
                tracing::info!("Bot is ready");
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    // The callback server shares the bot's HTTP handle so it can DM the user
    // once their account is connected.
    let port = std::env::var("OAUTH_CALLBACK_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_CALLBACK_PORT);
    let callback_state = CallbackState {
        exchanger: auth,
        notifier: Arc::new(DiscordConnectNotifier::new(client.http.clone())),
    };

    tokio::select! {
        result = http::serve(callback_state, port) => {
            if let Err(e) = result {
                tracing::error!("Callback server exited: {}", e);
            }
        }
        result = client.start() => {
            if let Err(e) = result {
                tracing::error!("Discord client exited: {}", e);
            }
        }
    }
}
