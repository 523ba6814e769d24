//! Slash command registration and option readers

pub mod slash;

use anyhow::{Context as _, Result};
use log::info;
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::{Command, CommandOptionType};
use serenity::model::application::interaction::application_command::{
    CommandDataOption, CommandDataOptionValue,
};
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::Context;

/// Every command the bot exposes
pub fn create_all_commands() -> Vec<CreateApplicationCommand> {
    let mut commands = slash::games::create_commands();
    commands.extend(slash::utility::create_commands());
    commands.extend(slash::server::create_commands());
    commands
}

pub async fn register_global_commands(ctx: &Context) -> Result<()> {
    let commands = create_all_commands();
    let count = commands.len();

    Command::set_global_application_commands(&ctx.http, |c| c.set_application_commands(commands))
        .await
        .context("Failed to register global commands")?;

    info!("Registered {count} global commands");
    Ok(())
}

pub async fn register_guild_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
    let commands = create_all_commands();
    let count = commands.len();

    guild_id
        .set_application_commands(&ctx.http, |c| c.set_application_commands(commands))
        .await
        .with_context(|| format!("Failed to register commands for guild {guild_id}"))?;

    info!("Registered {count} commands for guild {guild_id}");
    Ok(())
}

fn find<'a>(options: &'a [CommandDataOption], name: &str) -> Option<&'a CommandDataOption> {
    options.iter().find(|opt| opt.name == name)
}

pub fn get_string_option(options: &[CommandDataOption], name: &str) -> Option<String> {
    find(options, name)
        .and_then(|opt| opt.value.as_ref())
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

pub fn get_integer_option(options: &[CommandDataOption], name: &str) -> Option<i64> {
    find(options, name)
        .and_then(|opt| opt.value.as_ref())
        .and_then(|v| v.as_i64())
}

pub fn get_channel_option(options: &[CommandDataOption], name: &str) -> Option<ChannelId> {
    let opt = find(options, name)?;
    match opt.resolved {
        Some(CommandDataOptionValue::Channel(ref channel)) => Some(channel.id),
        _ => opt
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<u64>().ok())
            .map(ChannelId),
    }
}

/// The invoked subcommand and its own options
pub fn get_subcommand(options: &[CommandDataOption]) -> Option<(&str, &[CommandDataOption])> {
    options
        .iter()
        .find(|opt| opt.kind == CommandOptionType::SubCommand)
        .map(|opt| (opt.name.as_str(), opt.options.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn option(value: serde_json::Value) -> CommandDataOption {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_all_commands_have_unique_names() {
        let commands = create_all_commands();
        let mut names: Vec<String> = commands
            .iter()
            .filter_map(|c| c.0.get("name").and_then(|n| n.as_str()).map(str::to_string))
            .collect();
        assert_eq!(names.len(), 7);
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 7);
        assert!(names.contains(&"guess-the-number".to_string()));
        assert!(names.contains(&"welcome-config".to_string()));
    }

    #[test]
    fn test_scalar_option_readers() {
        let options = vec![
            option(json!({"name": "min", "type": 4, "value": 5})),
            option(json!({"name": "type", "type": 3, "value": "api"})),
        ];

        assert_eq!(get_integer_option(&options, "min"), Some(5));
        assert_eq!(get_integer_option(&options, "max"), None);
        assert_eq!(get_string_option(&options, "type").as_deref(), Some("api"));
        assert_eq!(get_string_option(&options, "min"), None);
    }

    #[test]
    fn test_channel_option_from_raw_value() {
        let options = vec![option(json!({"name": "channel", "type": 7, "value": "1234"}))];
        assert_eq!(get_channel_option(&options, "channel"), Some(ChannelId(1234)));
    }

    #[test]
    fn test_subcommand_reader() {
        let options = vec![option(json!({
            "name": "enable",
            "type": 1,
            "options": [{"name": "channel", "type": 7, "value": "99"}]
        }))];

        let (name, sub) = get_subcommand(&options).unwrap();
        assert_eq!(name, "enable");
        assert_eq!(get_channel_option(sub, "channel"), Some(ChannelId(99)));
        assert!(get_subcommand(&[]).is_none());
    }
}
