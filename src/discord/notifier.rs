// DMs the user once their Google account is linked, so they know to switch
// back to Discord without watching the browser tab.

use std::error::Error;
use std::sync::Arc;

use poise::serenity_prelude as serenity;

use crate::infra::http::ConnectNotifier;
use async_trait::async_trait;

pub struct DiscordConnectNotifier {
    http: Arc<serenity::Http>,
}

impl DiscordConnectNotifier {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ConnectNotifier for DiscordConnectNotifier {
    async fn notify_connected(&self, user_id: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let id: u64 = user_id.parse()?;
        if id == 0 {
            return Err("invalid user id".into());
        }

        let user = serenity::UserId::new(id).to_user(&self.http).await?;
        let channel = user.create_dm_channel(&self.http).await?;
        channel
            .id
            .say(
                &self.http,
                "✅ Google account connected! You can now ask me to create, \
                 read, edit, list, or delete your Google Docs.",
            )
            .await?;
        Ok(())
    }
}
