//! Utility slash commands: /ping

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

/// Creates utility commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![create_ping_command()]
}

/// Creates the ping command
fn create_ping_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("ping")
        .description("Check the bot's latency 🏓")
        .create_option(|option| {
            option
                .name("type")
                .description("Which latency to measure")
                .kind(CommandOptionType::String)
                .required(false)
                .add_string_choice("API", "api")
                .add_string_choice("WebSocket", "ws")
                .add_string_choice("Both", "both")
        })
        .to_owned()
}
