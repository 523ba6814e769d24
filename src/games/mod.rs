pub mod guess_dialogue;
pub mod guess_number;

pub use guess_dialogue::{GameAction, GameReply, GuessDialogue};
pub use guess_number::{GuessError, GuessSession, GuessTuning};
