// Core layer - configuration, runtime diagnostics and the game engine
pub mod config;
pub mod diagnostics;
pub mod games;
pub mod sessions;

// Features layer - server management, welcome system and presence
pub mod features;

// Presentation
pub mod message_components;
pub mod panels;

// Application layer
pub mod command_handler;
pub mod commands;

pub use config::Config;
pub use features::{Presence, SalonLedger, WelcomeSettings, WelcomeStore};
pub use games::{GameAction, GameReply, GuessDialogue, GuessError, GuessSession, GuessTuning};
pub use panels::Panel;
pub use sessions::SessionRegistry;
