//! Server slash commands: /server-stats, /create-category, /create-salon, /rename-server, /welcome-config

use crate::features::server_admin::SalonKind;
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;
use serenity::model::channel::ChannelType;
use serenity::model::permissions::Permissions;

/// Creates server management commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        create_server_stats_command(),
        create_category_command(),
        create_salon_command(),
        create_rename_server_command(),
        create_welcome_config_command(),
    ]
}

/// Creates the server-stats command
fn create_server_stats_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("server-stats")
        .description("Show server statistics 🌌")
        .dm_permission(false)
        .to_owned()
}

/// Creates the create-category command (MANAGE_CHANNELS)
fn create_category_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("create-category")
        .description("Create a new category 🗂️")
        .dm_permission(false)
        .default_member_permissions(Permissions::MANAGE_CHANNELS)
        .create_option(|option| {
            option
                .name("name")
                .description("🏷️ Category name")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("color")
                .description("🎨 Embed colour (hex: #RRGGBB)")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .create_option(|option| {
            option
                .name("emoji")
                .description("😊 Emoji put in front of the name")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .to_owned()
}

/// Creates the create-salon command (MANAGE_CHANNELS)
fn create_salon_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("create-salon")
        .description("Create one or more channels 🗂️")
        .dm_permission(false)
        .default_member_permissions(Permissions::MANAGE_CHANNELS)
        .create_option(|option| {
            option
                .name("type")
                .description("Kind of channel to create")
                .kind(CommandOptionType::String)
                .required(true);
            for kind in SalonKind::ALL {
                option.add_string_choice(kind.label(), kind.value());
            }
            option
        })
        .create_option(|option| {
            option
                .name("names")
                .description("Channel name (separate with commas to create several)")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("category")
                .description("Category to create the channels in")
                .kind(CommandOptionType::Channel)
                .channel_types(&[ChannelType::Category])
                .required(false)
        })
        .to_owned()
}

/// Creates the rename-server command (MANAGE_GUILD)
fn create_rename_server_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("rename-server")
        .description("Rename the server 🎉")
        .dm_permission(false)
        .default_member_permissions(Permissions::MANAGE_GUILD)
        .to_owned()
}

/// Creates the welcome-config command (MANAGE_GUILD)
fn create_welcome_config_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("welcome-config")
        .description("Configure welcome messages 👋")
        .dm_permission(false)
        .default_member_permissions(Permissions::MANAGE_GUILD)
        .create_option(|sub| {
            sub.name("enable")
                .description("Enable welcome messages in a channel")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|option| {
                    option
                        .name("channel")
                        .description("Channel for welcome messages")
                        .kind(CommandOptionType::Channel)
                        .channel_types(&[ChannelType::Text, ChannelType::News])
                        .required(true)
                })
        })
        .create_option(|sub| {
            sub.name("disable")
                .description("Disable welcome messages")
                .kind(CommandOptionType::SubCommand)
        })
        .create_option(|sub| {
            sub.name("test")
                .description("Send a test welcome message for yourself")
                .kind(CommandOptionType::SubCommand)
        })
        .create_option(|sub| {
            sub.name("status")
                .description("Show the current welcome settings")
                .kind(CommandOptionType::SubCommand)
        })
        .to_owned()
}
