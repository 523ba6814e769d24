//! Game slash commands: /guess-the-number

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

/// Creates game commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![create_guess_the_number_command()]
}

/// Creates the guess-the-number command
fn create_guess_the_number_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("guess-the-number")
        .description("Play guess the number 🎲")
        .dm_permission(false)
        .create_option(|option| {
            option
                .name("min")
                .description("Smallest possible number (default 1)")
                .kind(CommandOptionType::Integer)
                .required(false)
                .min_int_value(1)
                .max_int_value(999)
        })
        .create_option(|option| {
            option
                .name("max")
                .description("Largest possible number (default 100)")
                .kind(CommandOptionType::Integer)
                .required(false)
                .min_int_value(10)
                .max_int_value(1000)
        })
        .to_owned()
}
