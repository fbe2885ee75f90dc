// =============================================================================
// DISCORD EVENT HANDLER
// =============================================================================
//
// DM-only bot: every direct message goes through the auth gate and then to
// the agent. Interactive components (document picker, form modal) come back
// as interaction events and are matched against the pending slot stored when
// the component was sent.

use poise::serenity_prelude as serenity;

use crate::core::agent::UiRequest;
use crate::core::auth::identity;
use crate::discord::ui::{self, PendingKind, PendingUi};
use crate::discord::{Data, Error};

/// Discord caps messages at 2000 characters; leave headroom for formatting.
const CHUNK_LIMIT: usize = 1900;

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!("Connected to Discord as {}", data_about_bot.user.name);
        }
        serenity::FullEvent::Message { new_message } => {
            handle_dm(ctx, data, new_message).await;
        }
        serenity::FullEvent::InteractionCreate { interaction } => match interaction {
            serenity::Interaction::Component(component) => {
                if let Err(e) = handle_component(ctx, data, component).await {
                    tracing::error!("Component interaction failed: {}", e);
                }
            }
            serenity::Interaction::Modal(modal) => {
                if let Err(e) = handle_modal_submit(ctx, data, modal).await {
                    tracing::error!("Modal submission failed: {}", e);
                }
            }
            _ => {}
        },
        _ => {}
    }

    Ok(())
}

async fn handle_dm(ctx: &serenity::Context, data: &Data, message: &serenity::Message) {
    if message.author.bot {
        return;
    }
    // The bot only works over DMs; guild chatter is none of its business.
    if message.guild_id.is_some() {
        return;
    }
    if !data.allowed_users.is_empty() && !data.allowed_users.contains(&message.author.id.get()) {
        tracing::warn!("Ignoring DM from non-allowed user {}", message.author.id);
        return;
    }

    let user_id = message.author.id.to_string();

    if !data.auth.is_authenticated(&user_id).await {
        let consent_url = data.auth.consent_url(&user_id);
        let reply = serenity::CreateMessage::new()
            .content(
                "Hi! Before I can help with your Google Docs you need to \
                 connect your Google account. Click the button below, approve \
                 access, and then message me again.",
            )
            .components(vec![ui::auth_link_row(&consent_url)]);
        if let Err(e) = message.channel_id.send_message(&ctx.http, reply).await {
            tracing::error!("Failed to send auth prompt: {}", e);
        }
        return;
    }

    let _ = message.channel_id.broadcast_typing(&ctx.http).await;

    let reply = {
        let _guard = identity::bind(&user_id);
        data.agent.handle_message(&user_id, &message.content).await
    };

    deliver(ctx, data, message.channel_id, &user_id, reply).await;
}

/// Sends an agent outcome, chunked to fit Discord's message limit, with any
/// interactive component attached to the last chunk.
async fn deliver(
    ctx: &serenity::Context,
    data: &Data,
    channel_id: serenity::ChannelId,
    user_id: &str,
    reply: Result<crate::core::agent::AgentReply, crate::core::agent::AgentError>,
) {
    let reply = match reply {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!("Agent error for user {}: {}", user_id, e);
            let _ = channel_id
                .say(
                    &ctx.http,
                    format!("Something went wrong and I couldn't complete that: {e}"),
                )
                .await;
            return;
        }
    };

    let text = if reply.text.is_empty() {
        "(done)".to_string()
    } else {
        reply.text
    };
    let chunks = split_message(&text, CHUNK_LIMIT);
    let last = chunks.len() - 1;

    for (i, chunk) in chunks.into_iter().enumerate() {
        let mut builder = serenity::CreateMessage::new().content(chunk);

        if i == last {
            match &reply.ui {
                Some(UiRequest::DocumentPicker(docs)) => {
                    builder = builder.components(vec![ui::picker_row(user_id, docs)]);
                    data.pending_ui
                        .insert(user_id.to_string(), PendingUi::picker(docs.clone()));
                }
                Some(UiRequest::Form(form)) => {
                    builder = builder.components(vec![ui::form_button_row(user_id)]);
                    data.pending_ui
                        .insert(user_id.to_string(), PendingUi::form(form.clone()));
                }
                None => {}
            }
        }

        if let Err(e) = channel_id.send_message(&ctx.http, builder).await {
            tracing::error!("Failed to send reply chunk: {}", e);
        }
    }
}

async fn handle_component(
    ctx: &serenity::Context,
    data: &Data,
    component: &serenity::ComponentInteraction,
) -> Result<(), Error> {
    let Some(owner) = ui::user_from_custom_id(&component.data.custom_id) else {
        return Ok(());
    };

    if component.user.id.to_string() != owner {
        component
            .create_response(
                &ctx.http,
                ephemeral_message("This component isn't for you."),
            )
            .await?;
        return Ok(());
    }

    let user_id = owner.to_string();

    // Expired or missing slot: the component outlived its welcome.
    let expired = match data.pending_ui.get(&user_id) {
        Some(pending) => pending.is_expired(),
        None => true,
    };
    if expired {
        data.pending_ui.remove(&user_id);
        component
            .create_response(
                &ctx.http,
                ephemeral_message("That has expired. Ask me again to get a fresh one."),
            )
            .await?;
        return Ok(());
    }

    match &component.data.kind {
        serenity::ComponentInteractionDataKind::StringSelect { values } => {
            let Some(doc_id) = values.first() else {
                return Ok(());
            };

            let Some((_, pending)) = data.pending_ui.remove(&user_id) else {
                return Ok(());
            };
            let PendingKind::Picker(docs) = pending.kind else {
                return Ok(());
            };

            let doc_name = docs
                .iter()
                .find(|d| &d.id == doc_id)
                .map(|d| d.name.clone())
                .unwrap_or_else(|| doc_id.clone());

            // Grey the menu out so it can't be used twice.
            component
                .create_response(
                    &ctx.http,
                    serenity::CreateInteractionResponse::UpdateMessage(
                        serenity::CreateInteractionResponseMessage::new()
                            .components(vec![ui::disabled_picker_row(&user_id, &docs)]),
                    ),
                )
                .await?;

            let selection = format!("[Document selected] name: {doc_name}, id: {doc_id}");
            feed_agent(ctx, data, component.channel_id, &user_id, &selection).await;
        }
        serenity::ComponentInteractionDataKind::Button => {
            let form = match data.pending_ui.get(&user_id) {
                Some(pending) => match &pending.kind {
                    // Slot stays pending until the modal actually comes back.
                    PendingKind::Form(form) => form.clone(),
                    PendingKind::Picker(_) => return Ok(()),
                },
                None => return Ok(()),
            };

            component
                .create_response(
                    &ctx.http,
                    serenity::CreateInteractionResponse::Modal(ui::form_modal(&user_id, &form)),
                )
                .await?;
        }
        _ => {}
    }

    Ok(())
}

async fn handle_modal_submit(
    ctx: &serenity::Context,
    data: &Data,
    modal: &serenity::ModalInteraction,
) -> Result<(), Error> {
    let Some(owner) = ui::user_from_custom_id(&modal.data.custom_id) else {
        return Ok(());
    };
    if modal.user.id.to_string() != owner {
        return Ok(());
    }

    let user_id = owner.to_string();
    let Some((_, pending)) = data.pending_ui.remove(&user_id) else {
        modal
            .create_response(
                &ctx.http,
                ephemeral_message("That form has expired. Ask me again to get a fresh one."),
            )
            .await?;
        return Ok(());
    };
    let PendingKind::Form(form) = pending.kind else {
        return Ok(());
    };

    // Collect submitted values by their field-{i} custom ids.
    let mut answers = Vec::new();
    for row in &modal.data.components {
        for row_component in &row.components {
            if let serenity::ActionRowComponent::InputText(input) = row_component {
                let index: Option<usize> = input
                    .custom_id
                    .strip_prefix("field-")
                    .and_then(|s| s.parse().ok());
                let label = index
                    .and_then(|i| form.fields.get(i))
                    .map(|f| f.label.as_str())
                    .unwrap_or(&input.custom_id);
                let value = input.value.as_deref().unwrap_or_default();
                answers.push(format!("{label}: {value}"));
            }
        }
    }

    modal
        .create_response(&ctx.http, serenity::CreateInteractionResponse::Acknowledge)
        .await?;

    let submission = format!("[Form submitted]\n{}", answers.join("\n"));
    feed_agent(ctx, data, modal.channel_id, &user_id, &submission).await;

    Ok(())
}

/// Runs a synthesized follow-up (picker selection, form submission) through
/// the agent as if the user had typed it.
async fn feed_agent(
    ctx: &serenity::Context,
    data: &Data,
    channel_id: serenity::ChannelId,
    user_id: &str,
    content: &str,
) {
    let _ = channel_id.broadcast_typing(&ctx.http).await;

    let reply = {
        let _guard = identity::bind(user_id);
        data.agent.handle_message(user_id, content).await
    };

    deliver(ctx, data, channel_id, user_id, reply).await;
}

fn ephemeral_message(content: &str) -> serenity::CreateInteractionResponse {
    serenity::CreateInteractionResponse::Message(
        serenity::CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    )
}

/// Splits text into chunks of at most `limit` characters, preferring to break
/// on line boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.split_inclusive('\n') {
        if current.chars().count() + line.chars().count() > limit {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            // A single line longer than the limit gets hard-split.
            if line.chars().count() > limit {
                let mut piece = String::new();
                for c in line.chars() {
                    piece.push(c);
                    if piece.chars().count() == limit {
                        chunks.push(std::mem::take(&mut piece));
                    }
                }
                current = piece;
                continue;
            }
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    if chunks.is_empty() {
        chunks.push(String::new());
    }
    chunks
}

/// Parses ALLOWED_DISCORD_USER_IDS: comma-separated snowflakes, blanks
/// skipped. Empty result means no restriction.
pub fn parse_allow_list(raw: &str) -> std::collections::HashSet<u64> {
    raw.split(',')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            match part.parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    tracing::warn!("Ignoring invalid user id in allow list: {}", part);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_messages_stay_whole() {
        let chunks = split_message("hello world", 1900);
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn long_text_splits_on_line_boundaries() {
        let text = format!("{}\n{}", "a".repeat(60), "b".repeat(60));
        let chunks = split_message(&text, 100);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with('a'));
        assert!(chunks[1].starts_with('b'));
    }

    #[test]
    fn oversize_single_line_is_hard_split() {
        let text = "x".repeat(250);
        let chunks = split_message(&text, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[2].len(), 50);
    }

    #[test]
    fn empty_text_yields_one_empty_chunk() {
        assert_eq!(split_message("", 100), vec![String::new()]);
    }

    #[test]
    fn chunks_never_exceed_the_limit() {
        let text = "line one is fairly long\n".repeat(400);
        for chunk in split_message(&text, 1900) {
            assert!(chunk.chars().count() <= 1900);
        }
    }

    #[test]
    fn allow_list_parses_and_skips_junk() {
        let list = parse_allow_list("123, 456,, not-a-number , 789");
        assert_eq!(list.len(), 3);
        assert!(list.contains(&123));
        assert!(list.contains(&456));
        assert!(list.contains(&789));
    }

    #[test]
    fn empty_allow_list_means_everyone() {
        assert!(parse_allow_list("").is_empty());
        assert!(parse_allow_list(" , ").is_empty());
    }
}
