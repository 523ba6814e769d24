//! Slash command dispatch and the state shared with component handlers

use crate::commands::{get_channel_option, get_integer_option, get_string_option, get_subcommand};
use crate::config::Config;
use crate::diagnostics::{ping_panel, process_stats, uptime, PingKind, PingReading};
use crate::features::server_admin::{
    self, category_name, category_panel, create_category, fetch_snapshot, parse_salon_names,
    rename_expired_panel, rename_panel, salons_created_panel, stats_panel, SalonKind,
    DEFAULT_CATEGORY_COLOR,
};
use crate::features::welcome::{self, send_welcome, welcome_message, Arrival};
use crate::features::{Presence, SalonLedger, WelcomeStore};
use crate::games::{GameReply, GuessDialogue};
use crate::panels::{button_row, disable_all, parse_hex_color, ButtonSpec, Panel};
use crate::sessions::{ExpiryTimers, SessionRegistry, SessionSurface};
use anyhow::{Context as _, Result};
use chrono::Utc;
use dashmap::DashMap;
use log::{debug, info, warn};
use serenity::async_trait;
use serenity::client::bridge::gateway::{ShardId, ShardManager};
use serenity::http::Http;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::guild::Member;
use serenity::model::id::{ChannelId, GuildId, MessageId};
use serenity::model::permissions::Permissions;
use serenity::prelude::{Context, Mutex, TypeMapKey};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Client data key for the shard manager, used to read gateway latency
pub struct ShardManagerContainer;

impl TypeMapKey for ShardManagerContainer {
    type Value = Arc<Mutex<ShardManager>>;
}

/// Heartbeat latency of the current shard and the number of running shards
pub async fn shard_latency(ctx: &Context) -> (Option<Duration>, u32) {
    let manager = {
        let data = ctx.data.read().await;
        match data.get::<ShardManagerContainer>() {
            Some(manager) => manager.clone(),
            None => return (None, 1),
        }
    };

    let manager = manager.lock().await;
    let runners = manager.runners.lock().await;
    let latency = runners
        .get(&ShardId(ctx.shard_id))
        .and_then(|runner| runner.latency);
    (latency, runners.len().max(1) as u32)
}

/// `true` when the member's resolved permissions include `required`
pub fn member_allows(permissions: Option<Permissions>, required: Permissions) -> bool {
    permissions
        .map(|p| p.administrator() || p.contains(required))
        .unwrap_or(false)
}

/// What a panel turns into once its deadline passes
pub(crate) enum PanelExpiry {
    /// Keep the message, swap its buttons (an empty list removes them)
    Components(Vec<ButtonSpec>),
    Replace(Panel),
}

pub(crate) async fn expire_panel(http: &Http, channel: ChannelId, message: MessageId, expiry: PanelExpiry) {
    let result = channel
        .edit_message(http, message, |m| match expiry {
            PanelExpiry::Components(ref buttons) => m.set_components(button_row(buttons)),
            PanelExpiry::Replace(ref panel) => panel.fill_message_edit(m),
        })
        .await;

    if let Err(e) = result {
        debug!("Failed to expire panel {message}: {e}");
    }
}

/// Renders game expiry by editing the panel message in place
pub struct MessageSurface {
    http: Arc<Http>,
    channel: ChannelId,
    message: MessageId,
}

impl MessageSurface {
    pub fn new(http: Arc<Http>, channel: ChannelId, message: MessageId) -> Self {
        MessageSurface {
            http,
            channel,
            message,
        }
    }
}

#[async_trait]
impl SessionSurface<GameReply> for MessageSurface {
    async fn render_expiry(&self, reply: GameReply) {
        let panel = match reply {
            GameReply::Update(panel) | GameReply::UpdateWithNotice(panel, _) => panel,
            _ => return,
        };
        expire_panel(
            &self.http,
            self.channel,
            self.message,
            PanelExpiry::Replace(panel),
        )
        .await;
    }
}

#[derive(Clone)]
pub struct CommandHandler {
    pub(crate) config: Arc<Config>,
    pub(crate) games: SessionRegistry<GuessDialogue>,
    pub(crate) timers: ExpiryTimers,
    pub(crate) welcome: WelcomeStore,
    pub(crate) salons: SalonLedger,
    pub(crate) presence: Presence,
    pub(crate) ping_kinds: Arc<DashMap<u64, PingKind>>,
}

impl CommandHandler {
    pub fn new(config: Arc<Config>) -> Self {
        CommandHandler {
            config,
            games: SessionRegistry::new(),
            timers: ExpiryTimers::new(),
            welcome: WelcomeStore::new(),
            salons: SalonLedger::new(),
            presence: Presence::new(),
            ping_kinds: Arc::new(DashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn welcome_store(&self) -> &WelcomeStore {
        &self.welcome
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn games(&self) -> &SessionRegistry<GuessDialogue> {
        &self.games
    }

    pub async fn handle_slash_command(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        info!(
            "Processing slash command: {} from user: {}",
            command.data.name, command.user.id
        );

        match command.data.name.as_str() {
            "ping" => self.handle_ping(ctx, command).await,
            "guess-the-number" => self.handle_guess_the_number(ctx, command).await,
            "server-stats" => self.handle_server_stats(ctx, command).await,
            "create-category" => self.handle_create_category(ctx, command).await,
            "create-salon" => self.handle_create_salon(ctx, command).await,
            "rename-server" => self.handle_rename_server(ctx, command).await,
            "welcome-config" => self.handle_welcome_config(ctx, command).await,
            other => {
                warn!("Unknown slash command: {other}");
                reply_private(&ctx.http, command, "Unknown command.").await
            }
        }
    }

    // ========================================================================
    // /ping
    // ========================================================================

    async fn handle_ping(&self, ctx: &Context, command: &ApplicationCommandInteraction) -> Result<()> {
        let kind = PingKind::parse(get_string_option(&command.data.options, "type").as_deref());

        let started = Instant::now();
        command
            .create_interaction_response(&ctx.http, |response| {
                response.kind(InteractionResponseType::DeferredChannelMessageWithSource)
            })
            .await?;
        let rest = started.elapsed();

        let panel = self.measure_ping(ctx, kind, rest).await;
        let message = command
            .edit_original_interaction_response(&ctx.http, |edit| panel.fill_edit(edit))
            .await?;

        self.ping_kinds.insert(message.id.0, kind);
        self.arm_ping_expiry(ctx.http.clone(), message.channel_id, message.id, &panel.buttons);
        Ok(())
    }

    pub(crate) async fn measure_ping(&self, ctx: &Context, kind: PingKind, rest: Duration) -> Panel {
        let (gateway, _) = shard_latency(ctx).await;
        let memory_mb = tokio::task::spawn_blocking(process_stats)
            .await
            .ok()
            .flatten()
            .map(|stats| stats.resident_mb)
            .unwrap_or(0.0);

        ping_panel(kind, PingReading { gateway, rest }, memory_mb, uptime())
    }

    pub(crate) fn arm_ping_expiry(
        &self,
        http: Arc<Http>,
        channel: ChannelId,
        message: MessageId,
        buttons: &[ButtonSpec],
    ) {
        let kinds = self.ping_kinds.clone();
        let disabled = disable_all(buttons);
        self.timers
            .arm(message.0, self.config.panels.ping_timeout(), async move {
                kinds.remove(&message.0);
                expire_panel(&http, channel, message, PanelExpiry::Components(disabled)).await;
            });
    }

    // ========================================================================
    // /guess-the-number
    // ========================================================================

    async fn handle_guess_the_number(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let game = self.config.games.guess_the_number;
        let min = get_integer_option(&command.data.options, "min").unwrap_or(game.default_min);
        let max = get_integer_option(&command.data.options, "max").unwrap_or(game.default_max);

        let dialogue = match GuessDialogue::new(min, max, game) {
            Ok(dialogue) => dialogue,
            Err(e) => {
                return reply_private(&ctx.http, command, &format!("❌ Cannot start the game: {e}."))
                    .await
            }
        };

        reply_panel(&ctx.http, command, &dialogue.lobby_panel(), false).await?;
        let message = command.get_interaction_response(&ctx.http).await?;

        let surface = Arc::new(MessageSurface::new(
            ctx.http.clone(),
            message.channel_id,
            message.id,
        ));
        let id = self.games.open(message.id.0, command.user.id.0, dialogue, surface);

        info!(
            "[guess:{id}] {} opened a game on {min}..={max} in channel {}",
            command.user.name, message.channel_id
        );
        Ok(())
    }

    // ========================================================================
    // Server administration
    // ========================================================================

    async fn handle_server_stats(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let Some(guild_id) = self.require_guild(ctx, command).await? else {
            return Ok(());
        };

        let snapshot =
            fetch_snapshot(&ctx.http, guild_id, command.guild_locale.as_deref()).await?;
        reply_panel(
            &ctx.http,
            command,
            &stats_panel(&snapshot, &command.user.tag()),
            false,
        )
        .await
    }

    async fn handle_create_category(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let Some(guild_id) = self.require_guild(ctx, command).await? else {
            return Ok(());
        };
        if !self
            .require_permission(
                ctx,
                command,
                Permissions::MANAGE_CHANNELS,
                "⛔ You don't have permission to create categories.",
            )
            .await?
        {
            return Ok(());
        }

        let options = &command.data.options;
        let name = get_string_option(options, "name").context("Missing category name")?;
        let color_text =
            get_string_option(options, "color").unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string());
        let Some(color) = parse_hex_color(&color_text) else {
            return reply_private(
                &ctx.http,
                command,
                "❌ Invalid colour. Use the #RRGGBB format, for example #5865F2.",
            )
            .await;
        };
        let full_name = category_name(&name, get_string_option(options, "emoji").as_deref());

        command
            .create_interaction_response(&ctx.http, |response| {
                response.kind(InteractionResponseType::DeferredChannelMessageWithSource)
            })
            .await?;

        let category = create_category(&ctx.http, guild_id, &full_name).await?;
        info!("Created category {} ({}) in guild {guild_id}", category.name, category.id);

        let panel = category_panel(&category.name, category.id.0, command.user.id.0, color, Utc::now());
        command
            .edit_original_interaction_response(&ctx.http, |edit| panel.fill_edit(edit))
            .await?;
        Ok(())
    }

    async fn handle_create_salon(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let Some(guild_id) = self.require_guild(ctx, command).await? else {
            return Ok(());
        };
        if !self
            .require_permission(
                ctx,
                command,
                Permissions::MANAGE_CHANNELS,
                "❌ You don't have permission to manage channels on this server.",
            )
            .await?
        {
            return Ok(());
        }

        let options = &command.data.options;
        let kind = get_string_option(options, "type")
            .and_then(|value| SalonKind::parse(&value))
            .context("Missing or unknown channel type")?;
        let names = parse_salon_names(&get_string_option(options, "names").unwrap_or_default());
        if names.is_empty() {
            return reply_private(&ctx.http, command, "❌ Give at least one channel name.").await;
        }
        let parent = get_channel_option(options, "category");

        command
            .create_interaction_response(&ctx.http, |response| {
                response.kind(InteractionResponseType::DeferredChannelMessageWithSource)
            })
            .await?;

        let created = server_admin::create_salons(&ctx.http, guild_id, kind, &names, parent).await;
        if created.is_empty() {
            command
                .edit_original_interaction_response(&ctx.http, |edit| {
                    edit.content("❌ No channel could be created. Check the channel type and try again.")
                })
                .await?;
            return Ok(());
        }

        let ids: Vec<u64> = created.iter().map(|channel| channel.id.0).collect();
        let panel = salons_created_panel(kind, &ids, &command.user.tag());
        let message = command
            .edit_original_interaction_response(&ctx.http, |edit| panel.fill_edit(edit))
            .await?;

        self.salons.record(message.id.0, ids);

        let http = ctx.http.clone();
        let ledger = self.salons.clone();
        let disabled = disable_all(&panel.buttons);
        let (channel, message) = (message.channel_id, message.id);
        self.timers
            .arm(message.0, self.config.panels.salon_timeout(), async move {
                ledger.take(message.0);
                expire_panel(&http, channel, message, PanelExpiry::Components(disabled)).await;
            });
        Ok(())
    }

    async fn handle_rename_server(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let Some(guild_id) = self.require_guild(ctx, command).await? else {
            return Ok(());
        };
        if !self
            .require_permission(
                ctx,
                command,
                Permissions::MANAGE_GUILD,
                "❌ You don't have permission to rename this server.",
            )
            .await?
        {
            return Ok(());
        }

        let guild = guild_id
            .to_partial_guild(&ctx.http)
            .await
            .context("Failed to fetch guild")?;

        reply_panel(
            &ctx.http,
            command,
            &rename_panel(&guild.name, &command.user.tag()),
            false,
        )
        .await?;
        let message = command.get_interaction_response(&ctx.http).await?;

        let http = ctx.http.clone();
        let (channel, message) = (message.channel_id, message.id);
        self.timers
            .arm(message.0, self.config.panels.rename_timeout(), async move {
                expire_panel(&http, channel, message, PanelExpiry::Replace(rename_expired_panel())).await;
            });
        Ok(())
    }

    // ========================================================================
    // /welcome-config
    // ========================================================================

    async fn handle_welcome_config(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let Some(guild_id) = self.require_guild(ctx, command).await? else {
            return Ok(());
        };
        if !self
            .require_permission(
                ctx,
                command,
                Permissions::MANAGE_GUILD,
                "❌ You need the Manage Server permission to configure welcome messages.",
            )
            .await?
        {
            return Ok(());
        }

        let (subcommand, options) =
            get_subcommand(&command.data.options).context("Missing welcome-config subcommand")?;

        match subcommand {
            "enable" => {
                let channel = get_channel_option(options, "channel").context("Missing channel")?;
                self.welcome.enable(guild_id.0, channel.0);
                info!("[welcome] Enabled in guild {guild_id}, channel {channel}");
                self.reply_welcome_panel(ctx, command, welcome::enabled_panel(channel.0))
                    .await
            }
            "disable" => {
                if self.welcome.disable(guild_id.0) {
                    info!("[welcome] Disabled in guild {guild_id}");
                    self.reply_welcome_panel(ctx, command, welcome::disabled_panel())
                        .await
                } else {
                    reply_private(
                        &ctx.http,
                        command,
                        "ℹ️ Welcome messages are not enabled on this server.",
                    )
                    .await
                }
            }
            "test" => {
                let settings = self.welcome.settings(guild_id.0);
                let (true, Some(channel)) = (settings.enabled, settings.channel_id) else {
                    return reply_private(
                        &ctx.http,
                        command,
                        "❌ Welcome messages are not set up. Use `/welcome-config enable` first.",
                    )
                    .await;
                };
                let member = command.member.as_ref().context("Missing member")?;

                command
                    .create_interaction_response(&ctx.http, |response| {
                        response
                            .kind(InteractionResponseType::DeferredChannelMessageWithSource)
                            .interaction_response_data(|data| data.ephemeral(true))
                    })
                    .await?;

                let sent = self
                    .send_test_welcome(&ctx.http, guild_id, member, ChannelId(channel))
                    .await;
                let outcome = test_welcome_outcome(channel, &sent);

                command
                    .edit_original_interaction_response(&ctx.http, |edit| edit.content(outcome))
                    .await?;
                Ok(())
            }
            "status" => {
                let settings = self.welcome.settings(guild_id.0);
                self.reply_welcome_panel(ctx, command, welcome::status_panel(&settings))
                    .await
            }
            other => {
                warn!("[welcome] Unknown subcommand: {other}");
                reply_private(&ctx.http, command, "Unknown subcommand.").await
            }
        }
    }

    async fn reply_welcome_panel(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
        panel: Panel,
    ) -> Result<()> {
        reply_panel(&ctx.http, command, &panel, false).await?;
        let message = command.get_interaction_response(&ctx.http).await?;

        let http = ctx.http.clone();
        let (channel, message) = (message.channel_id, message.id);
        self.timers
            .arm(message.0, self.config.panels.welcome_timeout(), async move {
                expire_panel(&http, channel, message, PanelExpiry::Components(Vec::new())).await;
            });
        Ok(())
    }

    /// Posts the guild's welcome message for `member`, marked as a test
    pub(crate) async fn send_test_welcome(
        &self,
        http: &Http,
        guild_id: GuildId,
        member: &Member,
        channel: ChannelId,
    ) -> Result<()> {
        let settings = self.welcome.settings(guild_id.0);
        let guild = guild_id
            .to_partial_guild_with_counts(http)
            .await
            .context("Failed to fetch guild")?;

        let arrival = Arrival::from_member(member, &guild.name, guild.approximate_member_count, true);
        send_welcome(http, channel, &welcome_message(&settings, &arrival), &self.config.welcome).await?;

        info!("[welcome] Test message sent in guild {guild_id} by {}", member.user.name);
        Ok(())
    }

    // ========================================================================
    // Guards
    // ========================================================================

    async fn require_guild(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<Option<GuildId>> {
        if command.guild_id.is_none() {
            reply_private(&ctx.http, command, "This command only works in a server.").await?;
        }
        Ok(command.guild_id)
    }

    async fn require_permission(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
        required: Permissions,
        denial: &str,
    ) -> Result<bool> {
        let permissions = command.member.as_ref().and_then(|member| member.permissions);
        if member_allows(permissions, required) {
            return Ok(true);
        }

        info!(
            "Denied /{} to {}: missing {:?}",
            command.data.name, command.user.id, required
        );
        reply_private(&ctx.http, command, denial).await?;
        Ok(false)
    }
}

/// Final text of a deferred test-welcome reply
pub(crate) fn test_welcome_outcome(channel: u64, sent: &Result<()>) -> String {
    match sent {
        Ok(()) => format!("✅ Test message sent in <#{channel}>."),
        Err(e) => {
            warn!("[welcome] Test message in channel {channel} failed: {e:#}");
            format!("❌ Could not send the test message in <#{channel}>. Check my permissions there.")
        }
    }
}

pub(crate) async fn reply_private(
    http: &Http,
    command: &ApplicationCommandInteraction,
    text: &str,
) -> Result<()> {
    command
        .create_interaction_response(http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(text).ephemeral(true))
        })
        .await?;
    Ok(())
}

pub(crate) async fn reply_panel(
    http: &Http,
    command: &ApplicationCommandInteraction,
    panel: &Panel,
    ephemeral: bool,
) -> Result<()> {
    command
        .create_interaction_response(http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|data| {
                    let data = panel.fill_response(data);
                    if ephemeral {
                        data.ephemeral(true)
                    } else {
                        data
                    }
                })
        })
        .await?;
    Ok(())
}
