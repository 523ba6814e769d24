//! Button and modal routing

use crate::command_handler::{member_allows, shard_latency, test_welcome_outcome, CommandHandler};
use crate::diagnostics::{details_panel, process_stats, PingKind, PING_DETAILS, PING_REFRESH};
use crate::features::server_admin::{
    self, delete_salons, rename_cancelled_panel, rename_info_panel, rename_modal, renamed_panel,
    salons_deleted_panel, RenameRequest, RENAME_CANCEL, RENAME_INFO, RENAME_MODAL,
    RENAME_NAME_INPUT, RENAME_OPEN, RENAME_REASON_INPUT, SALON_DELETE,
};
use crate::features::welcome::{self, WelcomeSettings};
use crate::games::guess_dialogue::{GUESS_INPUT, GUESS_MODAL};
use crate::games::{GameAction, GameReply};
use crate::panels::{parse_hex_color, ModalSpec, Panel};
use crate::sessions::DeliveryError;
use anyhow::{Context as _, Result};
use log::{debug, info, warn};
use serenity::http::Http;
use serenity::model::application::component::{ActionRow, ActionRowComponent};
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::modal::ModalSubmitInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::channel::Message;
use serenity::model::guild::Member;
use serenity::model::id::{ChannelId, GuildId, UserId};
use serenity::model::permissions::Permissions;
use serenity::prelude::Context;
use chrono::Utc;
use std::time::{Duration, Instant};

/// The interaction being answered; buttons and modal submissions share the
/// response paths
enum Target<'a> {
    Component(&'a MessageComponentInteraction),
    Modal(&'a ModalSubmitInteraction),
}

impl Target<'_> {
    fn user(&self) -> UserId {
        match self {
            Target::Component(i) => i.user.id,
            Target::Modal(i) => i.user.id,
        }
    }

    async fn respond(
        &self,
        http: &Http,
        kind: InteractionResponseType,
        panel: &Panel,
        ephemeral: bool,
    ) -> Result<()> {
        match self {
            Target::Component(i) => {
                i.create_interaction_response(http, |r| {
                    r.kind(kind).interaction_response_data(|data| {
                        let data = panel.fill_response(data);
                        if ephemeral {
                            data.ephemeral(true)
                        } else {
                            data
                        }
                    })
                })
                .await?
            }
            Target::Modal(i) => {
                i.create_interaction_response(http, |r| {
                    r.kind(kind).interaction_response_data(|data| {
                        let data = panel.fill_response(data);
                        if ephemeral {
                            data.ephemeral(true)
                        } else {
                            data
                        }
                    })
                })
                .await?
            }
        }
        Ok(())
    }

    async fn update(&self, http: &Http, panel: &Panel) -> Result<()> {
        self.respond(http, InteractionResponseType::UpdateMessage, panel, false)
            .await
    }

    async fn notify(&self, http: &Http, text: impl Into<String>) -> Result<()> {
        self.respond(
            http,
            InteractionResponseType::ChannelMessageWithSource,
            &Panel::text(text),
            true,
        )
        .await
    }

    async fn notify_panel(&self, http: &Http, panel: &Panel) -> Result<()> {
        self.respond(http, InteractionResponseType::ChannelMessageWithSource, panel, true)
            .await
    }

    async fn open_modal(&self, http: &Http, modal: &ModalSpec) -> Result<()> {
        match self {
            Target::Component(i) => {
                i.create_interaction_response(http, |r| {
                    r.kind(InteractionResponseType::Modal)
                        .interaction_response_data(|data| modal.fill_response(data))
                })
                .await?;
                Ok(())
            }
            // a modal cannot answer a modal
            Target::Modal(_) => self.notify(http, "⚠️ Please use the buttons again.").await,
        }
    }

    /// Private follow-up after the interaction was answered
    async fn follow_up(&self, http: &Http, panel: &Panel) -> Result<()> {
        match self {
            Target::Component(i) => {
                i.create_followup_message(http, |f| {
                    if let Some(ref content) = panel.content {
                        f.content(content);
                    }
                    f.add_embeds(panel.embeds()).ephemeral(true)
                })
                .await?;
            }
            Target::Modal(i) => {
                i.create_followup_message(http, |f| {
                    if let Some(ref content) = panel.content {
                        f.content(content);
                    }
                    f.add_embeds(panel.embeds()).ephemeral(true)
                })
                .await?;
            }
        }
        Ok(())
    }
}

/// User who ran the command that posted `message`, when Discord says so
pub fn panel_owner(message: &Message) -> Option<UserId> {
    message.interaction.as_ref().map(|interaction| interaction.user.id)
}

fn owns_panel(message: Option<&Message>, user: UserId) -> bool {
    message
        .and_then(panel_owner)
        .map(|owner| owner == user)
        .unwrap_or(true)
}

/// Value typed into the text input `custom_id`
pub fn modal_value(rows: &[ActionRow], custom_id: &str) -> Option<String> {
    rows.iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            ActionRowComponent::InputText(input) if input.custom_id == custom_id => {
                Some(input.value.clone())
            }
            _ => None,
        })
}

pub fn delivery_notice(error: &DeliveryError) -> &'static str {
    match error {
        DeliveryError::NoSession => "⚠️ This game is no longer active.",
        DeliveryError::NotOwner => "⛔ Only the player who started this game can use these buttons.",
        DeliveryError::Closed => "⚠️ This game just ended.",
    }
}

/// How long a button on a just-posted game panel waits for its session
const FRESH_PANEL_PATIENCE: Duration = Duration::from_secs(1);

/// The lobby is posted before its session is registered under the message id
fn recently_posted(message: &Message, now_secs: i64) -> bool {
    now_secs - message.timestamp.unix_timestamp() < 10
}

const NOT_YOURS: &str = "⛔ Only the person who ran the command can use these buttons.";

#[derive(Clone)]
pub struct MessageComponentHandler {
    commands: CommandHandler,
}

impl MessageComponentHandler {
    pub fn new(commands: CommandHandler) -> Self {
        MessageComponentHandler { commands }
    }

    pub async fn handle_component_interaction(
        &self,
        ctx: &Context,
        component: &MessageComponentInteraction,
    ) -> Result<()> {
        let custom_id = component.data.custom_id.as_str();
        debug!(
            "Component {custom_id} pressed by {} on message {}",
            component.user.id, component.message.id
        );

        let target = Target::Component(component);

        if let Some(action) = GameAction::from_component(custom_id) {
            let patience = if recently_posted(&component.message, Utc::now().timestamp()) {
                FRESH_PANEL_PATIENCE
            } else {
                Duration::ZERO
            };
            return self
                .deliver_game(ctx, &target, component.message.id.0, action, patience)
                .await;
        }

        match custom_id {
            PING_REFRESH | PING_DETAILS => self.handle_ping_button(ctx, component, &target).await,
            SALON_DELETE => self.handle_salon_delete(ctx, component, &target).await,
            RENAME_OPEN | RENAME_INFO | RENAME_CANCEL => {
                self.handle_rename_button(ctx, component, &target).await
            }
            welcome::CUSTOMIZE
            | welcome::TEST
            | welcome::DISABLE
            | welcome::ENABLE
            | welcome::EDIT_MESSAGE
            | welcome::EDIT_COLOR
            | welcome::TOGGLE_IMAGE
            | welcome::SAVE => self.handle_welcome_button(ctx, component, &target).await,
            other => {
                warn!("Unknown component: {other}");
                target.notify(&ctx.http, "⚠️ This button is no longer supported.").await
            }
        }
    }

    pub async fn handle_modal_submit(
        &self,
        ctx: &Context,
        modal: &ModalSubmitInteraction,
    ) -> Result<()> {
        let target = Target::Modal(modal);
        let rows = &modal.data.components;

        match modal.data.custom_id.as_str() {
            GUESS_MODAL => {
                let Some(message) = modal.message.as_ref() else {
                    return target.notify(&ctx.http, delivery_notice(&DeliveryError::NoSession)).await;
                };
                let raw = modal_value(rows, GUESS_INPUT).unwrap_or_default();
                self.deliver_game(
                    ctx,
                    &target,
                    message.id.0,
                    GameAction::SubmitGuess(raw),
                    Duration::ZERO,
                )
                .await
            }
            RENAME_MODAL => self.handle_rename_modal(ctx, modal, &target).await,
            welcome::MESSAGE_MODAL | welcome::COLOR_MODAL => {
                self.handle_welcome_modal(ctx, modal, &target).await
            }
            other => {
                warn!("Unknown modal: {other}");
                target.notify(&ctx.http, "⚠️ This form is no longer supported.").await
            }
        }
    }

    // ========================================================================
    // Guess the number
    // ========================================================================

    async fn deliver_game(
        &self,
        ctx: &Context,
        target: &Target<'_>,
        message: u64,
        action: GameAction,
        patience: Duration,
    ) -> Result<()> {
        let reply = match self
            .commands
            .games
            .deliver_within(message, target.user().0, action, patience)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                debug!("Game delivery on message {message} refused: {e}");
                return target.notify(&ctx.http, delivery_notice(&e)).await;
            }
        };

        match reply {
            GameReply::Update(panel) => target.update(&ctx.http, &panel).await,
            GameReply::Notice(panel) => target.notify_panel(&ctx.http, &panel).await,
            GameReply::UpdateWithNotice(panel, notice) => {
                target.update(&ctx.http, &panel).await?;
                target.follow_up(&ctx.http, &notice).await
            }
            GameReply::Modal(modal) => target.open_modal(&ctx.http, &modal).await,
        }
    }

    // ========================================================================
    // Ping
    // ========================================================================

    async fn handle_ping_button(
        &self,
        ctx: &Context,
        component: &MessageComponentInteraction,
        target: &Target<'_>,
    ) -> Result<()> {
        if !owns_panel(Some(&component.message), component.user.id) {
            return target.notify(&ctx.http, NOT_YOURS).await;
        }

        if component.data.custom_id == PING_DETAILS {
            let (_, shards) = shard_latency(ctx).await;
            let stats = tokio::task::spawn_blocking(process_stats)
                .await
                .ok()
                .flatten();
            let panel = details_panel(stats.as_ref(), shards, self.commands.presence.guild_count());
            return target.notify_panel(&ctx.http, &panel).await;
        }

        let message = &component.message;
        let kind = self
            .commands
            .ping_kinds
            .get(&message.id.0)
            .map(|kind| *kind)
            .unwrap_or(PingKind::Both);

        let started = Instant::now();
        component
            .create_interaction_response(&ctx.http, |r| {
                r.kind(InteractionResponseType::DeferredUpdateMessage)
            })
            .await?;
        let rest = started.elapsed();

        let panel = self.commands.measure_ping(ctx, kind, rest).await;
        component
            .edit_original_interaction_response(&ctx.http, |edit| panel.fill_edit(edit))
            .await?;

        self.commands.ping_kinds.insert(message.id.0, kind);
        self.commands
            .arm_ping_expiry(ctx.http.clone(), message.channel_id, message.id, &panel.buttons);
        Ok(())
    }

    // ========================================================================
    // Channel creation
    // ========================================================================

    async fn handle_salon_delete(
        &self,
        ctx: &Context,
        component: &MessageComponentInteraction,
        target: &Target<'_>,
    ) -> Result<()> {
        if !owns_panel(Some(&component.message), component.user.id) {
            return target.notify(&ctx.http, NOT_YOURS).await;
        }

        let message = component.message.id.0;
        let Some(channels) = self.commands.salons.take(message) else {
            return target
                .notify(&ctx.http, "⚠️ These channels were already handled.")
                .await;
        };
        self.commands.timers.disarm(message);

        component
            .create_interaction_response(&ctx.http, |r| {
                r.kind(InteractionResponseType::DeferredUpdateMessage)
            })
            .await?;

        let deleted = delete_salons(&ctx.http, &channels).await;
        info!(
            "[salon] {} deleted {deleted}/{} channel(s)",
            component.user.name,
            channels.len()
        );

        let panel = salons_deleted_panel(deleted);
        component
            .edit_original_interaction_response(&ctx.http, |edit| panel.fill_edit(edit))
            .await?;
        Ok(())
    }

    // ========================================================================
    // Server rename
    // ========================================================================

    async fn handle_rename_button(
        &self,
        ctx: &Context,
        component: &MessageComponentInteraction,
        target: &Target<'_>,
    ) -> Result<()> {
        if !owns_panel(Some(&component.message), component.user.id) {
            return target.notify(&ctx.http, NOT_YOURS).await;
        }

        match component.data.custom_id.as_str() {
            RENAME_OPEN => {
                let guild_id = component.guild_id.context("Rename outside a guild")?;
                let guild = guild_id
                    .to_partial_guild(&ctx.http)
                    .await
                    .context("Failed to fetch guild")?;
                target.open_modal(&ctx.http, &rename_modal(&guild.name)).await
            }
            RENAME_INFO => target.notify_panel(&ctx.http, &rename_info_panel()).await,
            _ => {
                self.commands.timers.disarm(component.message.id.0);
                target.update(&ctx.http, &rename_cancelled_panel()).await
            }
        }
    }

    async fn handle_rename_modal(
        &self,
        ctx: &Context,
        modal: &ModalSubmitInteraction,
        target: &Target<'_>,
    ) -> Result<()> {
        if !owns_panel(modal.message.as_ref(), modal.user.id) {
            return target.notify(&ctx.http, NOT_YOURS).await;
        }
        let guild_id = modal.guild_id.context("Rename outside a guild")?;

        let rows = &modal.data.components;
        let name = modal_value(rows, RENAME_NAME_INPUT).unwrap_or_default();
        let reason = modal_value(rows, RENAME_REASON_INPUT);

        let request = match RenameRequest::parse(&name, reason.as_deref()) {
            Ok(request) => request,
            Err(e) => return target.notify(&ctx.http, format!("❌ {e}.")).await,
        };

        let old_name = match server_admin::rename_guild(&ctx.http, guild_id, &request).await {
            Ok(old_name) => old_name,
            Err(e) => {
                warn!("[rename] Guild {guild_id}: {e:#}");
                return target
                    .notify(&ctx.http, format!("❌ Could not rename the server: {e}"))
                    .await;
            }
        };

        if let Some(message) = modal.message.as_ref() {
            self.commands.timers.disarm(message.id.0);
        }

        target
            .update(&ctx.http, &renamed_panel(&old_name, &request, &modal.user.tag()))
            .await?;
        target
            .follow_up(&ctx.http, &Panel::text("✨ Server renamed! The panel has been updated."))
            .await
    }

    // ========================================================================
    // Welcome messages
    // ========================================================================

    /// Guild of the interaction, if the member may manage it
    async fn welcome_guild(
        &self,
        ctx: &Context,
        target: &Target<'_>,
        guild_id: Option<GuildId>,
        member: Option<&Member>,
    ) -> Result<Option<GuildId>> {
        let Some(guild_id) = guild_id else {
            target.notify(&ctx.http, "This only works in a server.").await?;
            return Ok(None);
        };

        if !member_allows(member.and_then(|m| m.permissions), Permissions::MANAGE_GUILD) {
            target
                .notify(
                    &ctx.http,
                    "❌ You need the Manage Server permission to configure welcome messages.",
                )
                .await?;
            return Ok(None);
        }
        Ok(Some(guild_id))
    }

    fn draft(&self, guild: u64, editor: u64) -> WelcomeSettings {
        let store = &self.commands.welcome;
        store
            .draft(guild, editor)
            .unwrap_or_else(|| store.begin_draft(guild, editor))
    }

    async fn handle_welcome_button(
        &self,
        ctx: &Context,
        component: &MessageComponentInteraction,
        target: &Target<'_>,
    ) -> Result<()> {
        let Some(guild_id) = self
            .welcome_guild(ctx, target, component.guild_id, component.member.as_ref())
            .await?
        else {
            return Ok(());
        };

        let store = &self.commands.welcome;
        let (guild, editor) = (guild_id.0, component.user.id.0);

        match component.data.custom_id.as_str() {
            welcome::CUSTOMIZE => {
                let draft = store.begin_draft(guild, editor);
                target
                    .notify_panel(&ctx.http, &welcome::customize_panel(&draft))
                    .await
            }
            welcome::TEST => {
                let settings = store.settings(guild);
                let (true, Some(channel)) = (settings.enabled, settings.channel_id) else {
                    return target
                        .notify(&ctx.http, "❌ Welcome messages are not enabled.")
                        .await;
                };
                let member = component.member.as_ref().context("Missing member")?;

                // guild fetch plus send retries can outlast the 3 s answer window
                component
                    .create_interaction_response(&ctx.http, |r| {
                        r.kind(InteractionResponseType::DeferredChannelMessageWithSource)
                            .interaction_response_data(|data| data.ephemeral(true))
                    })
                    .await?;

                let sent = self
                    .commands
                    .send_test_welcome(&ctx.http, guild_id, member, ChannelId(channel))
                    .await;
                let outcome = test_welcome_outcome(channel, &sent);
                component
                    .edit_original_interaction_response(&ctx.http, |edit| edit.content(outcome))
                    .await?;
                Ok(())
            }
            welcome::DISABLE => {
                store.disable(guild);
                info!("[welcome] Disabled in guild {guild_id}");
                target.update(&ctx.http, &welcome::disabled_panel()).await
            }
            welcome::ENABLE => match store.reenable(guild) {
                Some(channel) => {
                    info!("[welcome] Re-enabled in guild {guild_id}, channel {channel}");
                    target
                        .update(&ctx.http, &welcome::enabled_panel(channel))
                        .await
                }
                None => {
                    target
                        .notify(
                            &ctx.http,
                            "ℹ️ No welcome channel is configured. Use `/welcome-config enable`.",
                        )
                        .await
                }
            },
            welcome::EDIT_MESSAGE => {
                let draft = self.draft(guild, editor);
                target
                    .open_modal(&ctx.http, &welcome::message_modal(&draft))
                    .await
            }
            welcome::EDIT_COLOR => {
                let draft = self.draft(guild, editor);
                target.open_modal(&ctx.http, &welcome::color_modal(&draft)).await
            }
            welcome::TOGGLE_IMAGE => {
                self.draft(guild, editor);
                let draft = store
                    .edit_draft(guild, editor, |d| d.with_image = !d.with_image)
                    .context("Welcome draft vanished")?;
                target
                    .update(&ctx.http, &welcome::customize_panel(&draft))
                    .await
            }
            _ => match store.save_draft(guild, editor) {
                Some(_) => {
                    info!("[welcome] Settings saved in guild {guild_id} by {}", component.user.name);
                    target.update(&ctx.http, &welcome::saved_panel()).await
                }
                None => {
                    target
                        .notify(&ctx.http, "⚠️ Nothing to save. Press Customize first.")
                        .await
                }
            },
        }
    }

    async fn handle_welcome_modal(
        &self,
        ctx: &Context,
        modal: &ModalSubmitInteraction,
        target: &Target<'_>,
    ) -> Result<()> {
        let Some(guild_id) = self
            .welcome_guild(ctx, target, modal.guild_id, modal.member.as_ref())
            .await?
        else {
            return Ok(());
        };

        let store = &self.commands.welcome;
        let (guild, editor) = (guild_id.0, modal.user.id.0);
        let rows = &modal.data.components;
        self.draft(guild, editor);

        if modal.data.custom_id == welcome::COLOR_MODAL {
            let raw = modal_value(rows, welcome::INPUT_COLOR).unwrap_or_default();
            let Some(color) = parse_hex_color(&raw) else {
                return target
                    .notify(
                        &ctx.http,
                        "❌ Invalid colour. Use the #RRGGBB format, for example #5865F2.",
                    )
                    .await;
            };
            let color = format!("#{color:06X}");
            store.edit_draft(guild, editor, |d| d.embed_color = color.clone());
            return target
                .notify(
                    &ctx.http,
                    format!("✅ Colour set to {color}. Press 💾 Save to apply it."),
                )
                .await;
        }

        store.edit_draft(guild, editor, |d| {
            if let Some(message) = modal_value(rows, welcome::INPUT_MESSAGE) {
                d.message = message;
            }
            if let Some(title) = modal_value(rows, welcome::INPUT_TITLE) {
                d.embed_title = title;
            }
            if let Some(description) = modal_value(rows, welcome::INPUT_DESCRIPTION) {
                d.embed_description = description;
            }
            if let Some(footer) = modal_value(rows, welcome::INPUT_FOOTER) {
                d.embed_footer = footer;
            }
        });

        target
            .notify(&ctx.http, "✅ Message updated. Press 💾 Save to apply it.")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_modal_value_finds_input() {
        let rows: Vec<ActionRow> = serde_json::from_value(json!([
            {"type": 1, "components": [{"type": 4, "custom_id": "guess-input", "value": "42"}]},
            {"type": 1, "components": [{"type": 4, "custom_id": "other", "value": "x"}]}
        ]))
        .unwrap();

        assert_eq!(modal_value(&rows, "guess-input").as_deref(), Some("42"));
        assert_eq!(modal_value(&rows, "other").as_deref(), Some("x"));
        assert_eq!(modal_value(&rows, "missing"), None);
    }

    #[test]
    fn test_delivery_notices_are_distinct() {
        let notices = [
            delivery_notice(&DeliveryError::NoSession),
            delivery_notice(&DeliveryError::NotOwner),
            delivery_notice(&DeliveryError::Closed),
        ];
        assert_ne!(notices[0], notices[1]);
        assert_ne!(notices[1], notices[2]);
        assert!(notices[1].contains("Only the player"));
    }

    #[test]
    fn test_recently_posted_panels() {
        let message: Message = serde_json::from_value(json!({
            "id": "1",
            "channel_id": "2",
            "author": {"id": "3", "username": "salon", "discriminator": "0000", "avatar": null},
            "content": "",
            "timestamp": "2024-03-09T12:00:00+00:00",
            "edited_timestamp": null,
            "tts": false,
            "mention_everyone": false,
            "mentions": [],
            "mention_roles": [],
            "attachments": [],
            "embeds": [],
            "pinned": false,
            "type": 0
        }))
        .unwrap();
        let posted = message.timestamp.unix_timestamp();

        assert!(recently_posted(&message, posted + 1));
        assert!(!recently_posted(&message, posted + 60));
    }

    #[test]
    fn test_owns_panel_without_interaction_data() {
        assert!(owns_panel(None, UserId(1)));
    }
}
