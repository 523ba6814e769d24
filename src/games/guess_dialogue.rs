//! # Feature: Guess The Number (conversation)
//!
//! Lobby, round and replay screens around a [`GuessSession`]. Every button
//! press or modal submission becomes a [`GameAction`]; the answer is a
//! [`GameReply`] the Discord layer renders.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

use super::guess_number::{GuessError, GuessResult, GuessSession, Outcome, Reveal};
use crate::config::GuessGameConfig;
use crate::panels::{
    ButtonKind, ButtonSpec, EmbedSpec, InputSpec, ModalSpec, Panel, BLURPLE, GREEN, GREY, RED,
    SKY,
};
use crate::sessions::{Dialogue, Step};
use std::time::Duration;

pub const LAUNCH: &str = "launch-games";
pub const RULES: &str = "show-rules";
pub const QUIT: &str = "stop-games";
pub const GUESS: &str = "guess-number";
pub const HINT: &str = "get-hint";
pub const SURRENDER: &str = "surrender";
pub const REPLAY: &str = "replay-game";
pub const END: &str = "end-game";
pub const GUESS_MODAL: &str = "guess-modal";
pub const GUESS_INPUT: &str = "guess-input";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameAction {
    Launch,
    ShowRules,
    Quit,
    OpenGuess,
    SubmitGuess(String),
    Hint,
    Surrender,
    Replay,
    End,
}

impl GameAction {
    /// Maps a button custom id to its action
    pub fn from_component(custom_id: &str) -> Option<Self> {
        let action = match custom_id {
            LAUNCH => GameAction::Launch,
            RULES => GameAction::ShowRules,
            QUIT => GameAction::Quit,
            GUESS => GameAction::OpenGuess,
            HINT => GameAction::Hint,
            SURRENDER => GameAction::Surrender,
            REPLAY => GameAction::Replay,
            END => GameAction::End,
            _ => return None,
        };
        Some(action)
    }
}

/// What the Discord layer should do with the interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameReply {
    /// Replace the panel message
    Update(Panel),
    /// Private answer to the user, panel untouched
    Notice(Panel),
    /// Replace the panel and tell the user something privately
    UpdateWithNotice(Panel, Panel),
    /// Open a modal
    Modal(ModalSpec),
}

impl GameReply {
    fn notice(text: impl Into<String>) -> Self {
        GameReply::Notice(Panel::text(text))
    }
}

enum Phase {
    Lobby,
    Playing(GuessSession),
    /// Round over; keeps the last panel so expiry can strip its buttons
    Replay(Panel),
}

pub struct GuessDialogue {
    min: i64,
    max: i64,
    config: GuessGameConfig,
    phase: Phase,
}

impl GuessDialogue {
    /// A dialogue waiting in the lobby for the range `min..=max`
    pub fn new(min: i64, max: i64, config: GuessGameConfig) -> Result<Self, GuessError> {
        if min >= max {
            return Err(GuessError::InvalidRange { min, max });
        }
        Ok(GuessDialogue {
            min,
            max,
            config,
            phase: Phase::Lobby,
        })
    }

    /// Starts directly in a round, used with a known secret
    pub fn with_session(session: GuessSession, config: GuessGameConfig) -> Self {
        GuessDialogue {
            min: session.min(),
            max: session.max(),
            config,
            phase: Phase::Playing(session),
        }
    }

    pub fn lobby_panel(&self) -> Panel {
        lobby_panel(self.min, self.max)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.phase, Phase::Playing(_))
    }

    fn start_round(&mut self) -> Step<GameReply> {
        match GuessSession::new(self.min, self.max, self.config.tuning) {
            Ok(session) => {
                let panel = round_panel(&session, None);
                self.phase = Phase::Playing(session);
                Step::next(GameReply::Update(panel))
            }
            Err(e) => Step::last(GameReply::Update(Panel::embed(EmbedSpec::new(
                "❌ Error",
                e.to_string(),
                RED,
            )))),
        }
    }

    fn handle_lobby(&mut self, action: GameAction) -> Step<GameReply> {
        match action {
            GameAction::Launch => self.start_round(),
            GameAction::ShowRules => {
                Step::next(GameReply::Notice(rules_panel(self.min, self.max)))
            }
            GameAction::Quit => Step::last(GameReply::Update(Panel::embed(EmbedSpec::new(
                "❌ Game cancelled",
                "You left the game. See you next time!",
                RED,
            )))),
            _ => Step::next(GameReply::notice("⚠️ The game has not started yet.")),
        }
    }

    fn handle_round(&mut self, action: GameAction) -> Step<GameReply> {
        let Phase::Playing(ref mut session) = self.phase else {
            return Step::next(terminated());
        };

        match action {
            GameAction::OpenGuess => Step::next(GameReply::Modal(guess_modal(self.min, self.max))),
            GameAction::SubmitGuess(raw) => {
                let Ok(value) = raw.trim().parse::<i64>() else {
                    return Step::next(invalid_guess(self.min, self.max));
                };
                match session.submit_guess(value) {
                    Ok(result) if result.outcome == Outcome::Correct => {
                        let panel = victory_panel(session, &result);
                        let notice = Panel::text(format!(
                            "🎊 **Well done!** You found {} in {} attempts!",
                            value, result.attempts
                        ));
                        self.phase = Phase::Replay(panel.clone());
                        Step::next(GameReply::UpdateWithNotice(panel, notice))
                    }
                    Ok(result) => {
                        let note = match result.outcome {
                            Outcome::TooLow => "🔼 **Too low!** The number is higher.",
                            _ => "🔽 **Too high!** The number is lower.",
                        };
                        Step::next(GameReply::UpdateWithNotice(
                            round_panel(session, Some(result.outcome)),
                            Panel::text(note),
                        ))
                    }
                    Err(GuessError::OutOfRange { .. }) => {
                        Step::next(invalid_guess(self.min, self.max))
                    }
                    Err(_) => Step::next(terminated()),
                }
            }
            GameAction::Hint => match session.request_hint() {
                Ok(hint) => Step::next(GameReply::notice(hint.message())),
                Err(_) => Step::next(terminated()),
            },
            GameAction::Surrender => match session.surrender() {
                Ok(reveal) => {
                    let panel = surrender_panel(reveal);
                    self.phase = Phase::Replay(panel.clone());
                    Step::next(GameReply::Update(panel))
                }
                Err(_) => Step::next(terminated()),
            },
            _ => Step::next(GameReply::notice("⚠️ A round is already in progress.")),
        }
    }

    fn handle_replay(&mut self, action: GameAction) -> Step<GameReply> {
        match action {
            GameAction::Replay => self.start_round(),
            GameAction::End => Step::last(GameReply::Update(Panel::embed(EmbedSpec::new(
                "👋 Thanks for playing!",
                "See you soon for another round!",
                BLURPLE,
            )))),
            _ => Step::next(terminated()),
        }
    }
}

impl Dialogue for GuessDialogue {
    type Action = GameAction;
    type Reply = GameReply;

    fn handle(&mut self, action: GameAction) -> Step<GameReply> {
        match self.phase {
            Phase::Lobby => self.handle_lobby(action),
            Phase::Playing(_) => self.handle_round(action),
            Phase::Replay(_) => self.handle_replay(action),
        }
    }

    fn expire(&mut self) -> Option<GameReply> {
        match self.phase {
            Phase::Lobby => Some(GameReply::Update(Panel::embed(EmbedSpec::new(
                "⏰ Time's up",
                "The session expired due to inactivity.",
                GREY,
            )))),
            Phase::Playing(ref mut session) => {
                if !session.expire() {
                    return None;
                }
                let reveal = session.reveal();
                Some(GameReply::Update(Panel::embed(EmbedSpec::new(
                    "⏰ Time's up",
                    format!(
                        "### The round was stopped for inactivity\n\n\
                         ❓ **The secret number was:** {}\n\
                         🔢 **Attempts made:** {}",
                        reveal.secret, reveal.attempts
                    ),
                    GREY,
                ))))
            }
            Phase::Replay(ref panel) => Some(GameReply::Update(Panel {
                buttons: Vec::new(),
                ..panel.clone()
            })),
        }
    }

    fn idle_timeout(&self) -> Duration {
        let secs = match self.phase {
            Phase::Lobby => self.config.lobby_timeout_secs,
            Phase::Playing(_) => self.config.round_timeout_secs,
            Phase::Replay(_) => self.config.replay_timeout_secs,
        };
        Duration::from_secs(secs)
    }
}

fn terminated() -> GameReply {
    GameReply::notice(format!("⚠️ {}", capitalize(&GuessError::SessionTerminated.to_string())))
}

fn invalid_guess(min: i64, max: i64) -> GameReply {
    GameReply::notice(format!(
        "⚠️ **Invalid number!** Please enter a number between {min} and {max}."
    ))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn lobby_panel(min: i64, max: i64) -> Panel {
    let embed = EmbedSpec::new(
        "🎮 Guess The Number",
        format!(
            "### 🎲 Welcome to Guess The Number! 🎲\n\n\
             🔢 Your mission: find the secret number between **{min}** and **{max}**!\n\n\
             🏆 See how many attempts it takes you.\n\n\
             📊 After each guess you will know whether it was too high or too low.\n\n\
             🚀 Press \"Start\" to begin!"
        ),
        SKY,
    )
    .footer("🎯 Good luck and have fun!");

    Panel::embed(embed).with_buttons(vec![
        ButtonSpec::new(LAUNCH, "🎮 Start", ButtonKind::Primary),
        ButtonSpec::new(RULES, "📜 Rules", ButtonKind::Secondary),
        ButtonSpec::new(QUIT, "❌ Quit", ButtonKind::Danger),
    ])
}

fn rules_panel(min: i64, max: i64) -> Panel {
    let embed = EmbedSpec::new(
        "📜 Rules",
        format!(
            "### 📋 How to play Guess The Number\n\n\
             1️⃣ The game picks a random number between **{min}** and **{max}**\n\n\
             2️⃣ Each turn, you submit a number\n\n\
             3️⃣ The bot tells you whether it is:\n\
             🔼 Too high\n🔽 Too low\n✅ Correct\n\n\
             4️⃣ Find the number in as few attempts as possible!\n\n\
             💡 **Tip:** a binary search finds it fastest!"
        ),
        BLURPLE,
    )
    .footer("🧠 A good strategy wins in very few attempts!");
    Panel::embed(embed)
}

fn round_buttons() -> Vec<ButtonSpec> {
    vec![
        ButtonSpec::new(GUESS, "🔢 Make a guess", ButtonKind::Primary),
        ButtonSpec::new(HINT, "💡 Hint", ButtonKind::Secondary),
        ButtonSpec::new(SURRENDER, "🏳️ Give up", ButtonKind::Danger),
    ]
}

fn replay_buttons(replay_label: &str, end_label: &str, replay_kind: ButtonKind) -> Vec<ButtonSpec> {
    vec![
        ButtonSpec::new(REPLAY, replay_label, replay_kind),
        ButtonSpec::new(END, end_label, ButtonKind::Secondary),
    ]
}

fn history_lines(session: &GuessSession) -> String {
    session
        .history()
        .map(|record| format!("- {} - {}", record.value, record.outcome.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// In-progress panel; `last` is the outcome of the guess just scored
pub fn round_panel(session: &GuessSession, last: Option<Outcome>) -> Panel {
    let (min, max) = (session.min(), session.max());
    let mut description = format!(
        "### 🎯 Find the number between **{min}** and **{max}**!\n\n\
         🔢 **Attempts:** {}\n",
        session.attempts()
    );

    if session.history_len() == 0 {
        description.push_str("📊 **Latest guesses:** none\n\nPress \"Make a guess\" to submit a number.");
    } else {
        if let Some(proximity) = session.proximity() {
            description.push_str(proximity.message());
            description.push('\n');
        }
        description.push_str("\n📊 **Latest guesses:**\n");
        description.push_str(&history_lines(session));
        match last {
            Some(Outcome::TooLow) => {
                description.push_str("\n\n🔼 **Hint:** The number is **higher** than your guess!")
            }
            Some(Outcome::TooHigh) => {
                description.push_str("\n\n🔽 **Hint:** The number is **lower** than your guess!")
            }
            _ => {}
        }
    }

    let footer = if session.attempts() == 0 {
        "🧩 Use logic to find the number as fast as possible!".to_string()
    } else {
        format!("Attempt {} - keep going, you're getting closer!", session.attempts())
    };

    Panel::embed(EmbedSpec::new("🎮 Round in progress", description, BLURPLE).footer(footer))
        .with_buttons(round_buttons())
}

fn victory_panel(session: &GuessSession, result: &GuessResult) -> Panel {
    let reveal = session.reveal();
    let rating = result.rating.map(|r| r.message()).unwrap_or_default();
    let description = format!(
        "### 🏆 Congratulations! You found the number!\n\n\
         ✨ **The number was:** {}\n\
         🔢 **Attempts:** {}\n\
         {}\n\n\
         📊 **History:**\n{}\n\n\
         🎮 Thanks for playing! Another round?",
        reveal.secret,
        reveal.attempts,
        rating,
        history_lines(session)
    );

    Panel::embed(EmbedSpec::new("🎉 VICTORY! 🎉", description, GREEN))
        .with_buttons(replay_buttons("🔄 Play again", "👋 Finish", ButtonKind::Success))
}

fn surrender_panel(reveal: Reveal) -> Panel {
    let description = format!(
        "### You gave up the round\n\n\
         ❓ **The secret number was:** {}\n\
         🔢 **Attempts made:** {}\n\n\
         Feel free to try again whenever you want!",
        reveal.secret, reveal.attempts
    );

    Panel::embed(EmbedSpec::new("🏳️ Round abandoned", description, RED))
        .with_buttons(replay_buttons("🔄 New round", "👋 Quit", ButtonKind::Primary))
}

pub fn guess_modal(min: i64, max: i64) -> ModalSpec {
    ModalSpec::new(
        GUESS_MODAL,
        "🔢 Guess the number",
        vec![InputSpec::short(GUESS_INPUT, format!("Enter a number between {min} and {max}"))
            .placeholder("Your guess...")
            .length(1, 4)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::guess_number::{GuessTuning, Status};

    fn config() -> GuessGameConfig {
        GuessGameConfig::default()
    }

    fn playing(secret: i64) -> GuessDialogue {
        let session = GuessSession::with_secret(1, 100, secret, GuessTuning::default()).unwrap();
        GuessDialogue::with_session(session, config())
    }

    fn submit(dialogue: &mut GuessDialogue, raw: &str) -> Step<GameReply> {
        dialogue.handle(GameAction::SubmitGuess(raw.to_string()))
    }

    fn notice_text(reply: &GameReply) -> String {
        match reply {
            GameReply::Notice(panel) | GameReply::UpdateWithNotice(_, panel) => {
                panel.content.clone().unwrap_or_default()
            }
            other => panic!("expected a notice, got {other:?}"),
        }
    }

    #[test]
    fn test_component_ids_map_to_actions() {
        assert_eq!(GameAction::from_component(LAUNCH), Some(GameAction::Launch));
        assert_eq!(GameAction::from_component(SURRENDER), Some(GameAction::Surrender));
        assert_eq!(GameAction::from_component(END), Some(GameAction::End));
        assert_eq!(GameAction::from_component("ping_refresh"), None);
    }

    #[test]
    fn test_new_rejects_inverted_range() {
        assert!(matches!(
            GuessDialogue::new(50, 10, config()),
            Err(GuessError::InvalidRange { min: 50, max: 10 })
        ));
    }

    #[test]
    fn test_lobby_flow() {
        let mut dialogue = GuessDialogue::new(1, 100, config()).unwrap();
        assert_eq!(dialogue.lobby_panel().button_ids(), vec![LAUNCH, RULES, QUIT]);
        assert_eq!(dialogue.idle_timeout(), Duration::from_secs(120));

        let rules = dialogue.handle(GameAction::ShowRules);
        assert!(!rules.finished);
        assert!(matches!(rules.reply, GameReply::Notice(_)));

        let launched = dialogue.handle(GameAction::Launch);
        assert!(!launched.finished);
        match launched.reply {
            GameReply::Update(panel) => assert_eq!(panel.button_ids(), vec![GUESS, HINT, SURRENDER]),
            other => panic!("unexpected reply {other:?}"),
        }
        assert!(dialogue.is_playing());
        assert_eq!(dialogue.idle_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_quit_ends_dialogue() {
        let mut dialogue = GuessDialogue::new(1, 100, config()).unwrap();
        let step = dialogue.handle(GameAction::Quit);
        assert!(step.finished);
        match step.reply {
            GameReply::Update(panel) => assert!(panel.buttons.is_empty()),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn test_open_guess_shows_modal() {
        let mut dialogue = playing(42);
        match dialogue.handle(GameAction::OpenGuess).reply {
            GameReply::Modal(modal) => {
                assert_eq!(modal.custom_id, GUESS_MODAL);
                assert_eq!(modal.inputs[0].custom_id, GUESS_INPUT);
                assert_eq!(modal.inputs[0].max_length, Some(4));
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn test_invalid_submissions_do_not_count() {
        let mut dialogue = playing(42);
        for raw in ["abc", "", "0", "101", "4.5"] {
            let step = submit(&mut dialogue, raw);
            assert!(matches!(step.reply, GameReply::Notice(_)), "input {raw:?}");
            assert!(notice_text(&step.reply).contains("Invalid number"));
        }

        // first valid guess is attempt 1
        match submit(&mut dialogue, " 50 ").reply {
            GameReply::UpdateWithNotice(panel, notice) => {
                let embed = panel.embed.unwrap();
                assert!(embed.description.contains("**Attempts:** 1"));
                assert!(embed.description.contains("50 - 🔼 Too high"));
                assert!(notice.content.unwrap().contains("Too high"));
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn test_win_moves_to_replay() {
        let mut dialogue = playing(42);
        submit(&mut dialogue, "50");
        submit(&mut dialogue, "20");
        let step = submit(&mut dialogue, "42");

        assert!(!step.finished);
        match step.reply {
            GameReply::UpdateWithNotice(panel, notice) => {
                assert_eq!(panel.button_ids(), vec![REPLAY, END]);
                let description = panel.embed.unwrap().description;
                assert!(description.contains("**The number was:** 42"));
                assert!(description.contains("**Attempts:** 3"));
                assert!(notice.content.unwrap().contains("3 attempts"));
            }
            other => panic!("unexpected reply {other:?}"),
        }
        assert_eq!(dialogue.idle_timeout(), Duration::from_secs(60));

        // a late modal submission after the win
        let late = submit(&mut dialogue, "42");
        assert!(notice_text(&late.reply).contains("already over"));
    }

    #[test]
    fn test_hint_is_private_and_free() {
        let mut dialogue = playing(42);
        let step = dialogue.handle(GameAction::Hint);
        assert!(notice_text(&step.reply).contains("**even**"));

        match submit(&mut dialogue, "10").reply {
            GameReply::UpdateWithNotice(panel, _) => {
                assert!(panel.embed.unwrap().description.contains("**Attempts:** 1"))
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn test_surrender_then_end() {
        let mut dialogue = playing(42);
        match dialogue.handle(GameAction::Surrender).reply {
            GameReply::Update(panel) => {
                let description = panel.embed.as_ref().unwrap().description.clone();
                assert!(description.contains("42"));
                assert_eq!(panel.button_ids(), vec![REPLAY, END]);
            }
            other => panic!("unexpected reply {other:?}"),
        }

        let end = dialogue.handle(GameAction::End);
        assert!(end.finished);
    }

    #[test]
    fn test_replay_starts_fresh_round() {
        let mut dialogue = playing(42);
        dialogue.handle(GameAction::Surrender);

        let step = dialogue.handle(GameAction::Replay);
        assert!(!step.finished);
        assert!(dialogue.is_playing());
        match step.reply {
            GameReply::Update(panel) => {
                assert!(panel.embed.unwrap().description.contains("**Attempts:** 0"))
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn test_expire_per_phase() {
        let mut lobby = GuessDialogue::new(1, 100, config()).unwrap();
        assert!(matches!(lobby.expire(), Some(GameReply::Update(p)) if p.buttons.is_empty()));

        let mut round = playing(42);
        submit(&mut round, "7");
        match round.expire() {
            Some(GameReply::Update(panel)) => {
                let description = panel.embed.unwrap().description;
                assert!(description.contains("42"));
                assert!(description.contains("**Attempts made:** 1"));
            }
            other => panic!("unexpected expiry {other:?}"),
        }

        let mut replay = playing(42);
        submit(&mut replay, "42");
        match replay.expire() {
            Some(GameReply::Update(panel)) => {
                assert!(panel.buttons.is_empty());
                assert!(panel.embed.unwrap().title.contains("VICTORY"));
            }
            other => panic!("unexpected expiry {other:?}"),
        }
    }

    #[test]
    fn test_expire_after_win_leaves_status() {
        let mut session = GuessSession::with_secret(1, 10, 5, GuessTuning::default()).unwrap();
        session.submit_guess(5).unwrap();
        assert!(!session.expire());
        assert_eq!(session.status(), Status::Won);
    }
}
