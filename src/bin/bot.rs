//! Salon Discord bot entry point
//!
//! Configuration comes from (first match wins):
//! - the YAML file named by `CONFIG_FILE`
//! - ./config.yaml
//! - environment variables

use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use serenity::async_trait;
use serenity::model::application::interaction::{Interaction, InteractionResponseType};
use serenity::model::gateway::Ready;
use serenity::model::guild::{Guild, Member, UnavailableGuild};
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use salon::command_handler::{CommandHandler, ShardManagerContainer};
use salon::commands::{register_global_commands, register_guild_commands};
use salon::config::Config;
use salon::diagnostics;
use salon::features::welcome;
use salon::message_components::MessageComponentHandler;

struct Handler {
    command_handler: Arc<CommandHandler>,
    component_handler: Arc<MessageComponentHandler>,
    guild_id: Option<GuildId>,
}

impl Handler {
    fn new(command_handler: CommandHandler, guild_id: Option<GuildId>) -> Self {
        let component_handler = MessageComponentHandler::new(command_handler.clone());
        Handler {
            command_handler: Arc::new(command_handler),
            component_handler: Arc::new(component_handler),
            guild_id,
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected and ready!", ready.user.name);
        info!("Connected to {} guilds", ready.guilds.len());
        info!("Bot ID: {}", ready.user.id);

        if let Some(shard) = ready.shard {
            info!("Shard: {}/{}", shard[0] + 1, shard[1]);
        }

        let presence = self.command_handler.presence();
        for guild in &ready.guilds {
            presence.join(guild.id.0);
        }

        if let Some(guild_id) = self.guild_id {
            info!("Development mode: Registering commands for guild {guild_id}");
            if let Err(e) = register_guild_commands(&ctx, guild_id).await {
                error!("Failed to register guild slash commands: {e:#}");
            }
        } else {
            info!("Production mode: Registering commands globally");
            if let Err(e) = register_global_commands(&ctx).await {
                error!("Failed to register global slash commands: {e:#}");
            }
        }

        presence.apply(&ctx).await;
        let every = Duration::from_secs(self.command_handler.config().presence_refresh_minutes * 60);
        if !presence.start_refresh(ctx.clone(), every) {
            info!("Skipping presence refresh setup (reconnect)");
        }
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild) {
        if self.command_handler.presence().join(guild.id.0) {
            info!("Joined guild {} ({})", guild.name, guild.id);
        }
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild) {
        // unavailable means an outage, not a removal
        if incomplete.unavailable {
            warn!("Guild {} became unavailable", incomplete.id);
            return;
        }
        if self.command_handler.presence().leave(incomplete.id.0) {
            info!("Left guild {}", incomplete.id);
        }
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        if new_member.user.bot {
            return;
        }

        if let Err(e) = welcome::on_member_join(
            &ctx.http,
            self.command_handler.welcome_store(),
            &self.command_handler.config().welcome,
            &new_member,
        )
        .await
        {
            error!(
                "[welcome] Failed to welcome {} in guild {}: {e:#}",
                new_member.user.name, new_member.guild_id
            );
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::ApplicationCommand(command) => {
                if let Err(e) = self
                    .command_handler
                    .handle_slash_command(&ctx, &command)
                    .await
                {
                    error!("Error handling slash command '{}': {e:#}", command.data.name);

                    let error_message =
                        "Sorry, I encountered an error processing your command. Please try again.";

                    #[allow(clippy::redundant_pattern_matching)]
                    if let Err(_) = command
                        .edit_original_interaction_response(&ctx.http, |response| {
                            response.content(error_message)
                        })
                        .await
                    {
                        let _ = command
                            .create_interaction_response(&ctx.http, |response| {
                                response
                                    .kind(InteractionResponseType::ChannelMessageWithSource)
                                    .interaction_response_data(|message| {
                                        message.content(error_message).ephemeral(true)
                                    })
                            })
                            .await;
                    }
                }
            }
            Interaction::MessageComponent(component) => {
                if let Err(e) = self
                    .component_handler
                    .handle_component_interaction(&ctx, &component)
                    .await
                {
                    error!(
                        "Error handling component interaction '{}': {e:#}",
                        component.data.custom_id
                    );

                    let error_message =
                        "Sorry, I encountered an error processing your interaction. Please try again.";

                    // the panel itself stays as it was; answer privately
                    #[allow(clippy::redundant_pattern_matching)]
                    if let Err(_) = component
                        .create_interaction_response(&ctx.http, |response| {
                            response
                                .kind(InteractionResponseType::ChannelMessageWithSource)
                                .interaction_response_data(|message| {
                                    message.content(error_message).ephemeral(true)
                                })
                        })
                        .await
                    {
                        let _ = component
                            .create_followup_message(&ctx.http, |message| {
                                message.content(error_message).ephemeral(true)
                            })
                            .await;
                    }
                }
            }
            Interaction::ModalSubmit(modal) => {
                if let Err(e) = self
                    .component_handler
                    .handle_modal_submit(&ctx, &modal)
                    .await
                {
                    error!("Error handling modal submit '{}': {e:#}", modal.data.custom_id);

                    let error_message =
                        "Sorry, I encountered an error processing your submission. Please try again.";

                    #[allow(clippy::redundant_pattern_matching)]
                    if let Err(_) = modal
                        .create_interaction_response(&ctx.http, |response| {
                            response
                                .kind(InteractionResponseType::ChannelMessageWithSource)
                                .interaction_response_data(|message| {
                                    message.content(error_message).ephemeral(true)
                                })
                        })
                        .await
                    {
                        let _ = modal
                            .create_followup_message(&ctx.http, |message| {
                                message.content(error_message).ephemeral(true)
                            })
                            .await;
                    }
                }
            }
            Interaction::Autocomplete(_) => {}
            Interaction::Ping(_) => {
                info!("Ping interaction received");
            }
        }
    }
}

/// Run the bot with retry logic
async fn run_bot(config: Arc<Config>, command_handler: CommandHandler) -> Result<()> {
    let max_retries = 5;
    let mut retry_count = 0;

    loop {
        info!("Starting bot (attempt {}/{})", retry_count + 1, max_retries);

        match run_bot_inner(config.clone(), command_handler.clone()).await {
            Ok(()) => {
                info!("Bot exited normally");
                break;
            }
            Err(e) => {
                retry_count += 1;
                if retry_count >= max_retries {
                    error!("Bot failed after {} retries: {:#}", max_retries, e);
                    return Err(e);
                }

                let delay = Duration::from_secs(5 * retry_count as u64);
                warn!("Bot failed: {:#}. Retrying in {:?}...", e, delay);
                tokio::time::sleep(delay).await;
            }
        }
    }

    Ok(())
}

/// Single connection attempt
async fn run_bot_inner(config: Arc<Config>, command_handler: CommandHandler) -> Result<()> {
    let guild_id = config.dev_guild().map(GuildId);
    let handler = Handler::new(command_handler, guild_id);

    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::GUILD_MEMBERS;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    {
        let mut data = client.data.write().await;
        data.insert::<ShardManagerContainer>(client.shard_manager.clone());
    }

    let shard_manager = client.shard_manager.clone();
    let shutdown = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down shards...");
                shard_manager.lock().await.shutdown_all().await;
            }
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
        }
    });

    info!("Connecting to Discord gateway...");

    let result = client.start().await;
    shutdown.abort();

    result.map_err(|e| {
        error!("Gateway connection failed: {e}");
        anyhow::anyhow!("Gateway connection failed: {}", e)
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = Config::auto_load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.log_level),
    )
    .init();

    diagnostics::mark_start();
    info!(
        "Starting Salon Discord Bot v{} ({})",
        env!("CARGO_PKG_VERSION"),
        diagnostics::build_commit()
    );

    let config = Arc::new(config);
    let command_handler = CommandHandler::new(config.clone());

    run_bot(config, command_handler).await
}
