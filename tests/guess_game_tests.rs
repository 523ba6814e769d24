//! End-to-end game flows through the session registry
//!
//! Run with: cargo test --test guess_game_tests

use salon::config::GuessGameConfig;
use salon::games::guess_dialogue::{END, GUESS, HINT, REPLAY, SURRENDER};
use salon::games::guess_number::{Outcome, Rating, Status};
use salon::sessions::{DeliveryError, SessionSurface};
use salon::{GameAction, GameReply, GuessDialogue, GuessSession, GuessTuning, SessionRegistry};
use serenity::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const PLAYER: u64 = 1001;
const BYSTANDER: u64 = 2002;

#[derive(Default)]
struct Recorder {
    expired: Mutex<Vec<GameReply>>,
}

#[async_trait]
impl SessionSurface<GameReply> for Recorder {
    async fn render_expiry(&self, reply: GameReply) {
        self.expired.lock().await.push(reply);
    }
}

fn open_round(
    registry: &SessionRegistry<GuessDialogue>,
    key: u64,
    secret: i64,
) -> Arc<Recorder> {
    let session = GuessSession::with_secret(1, 100, secret, GuessTuning::default()).unwrap();
    let surface = Arc::new(Recorder::default());
    registry.open(
        key,
        PLAYER,
        GuessDialogue::with_session(session, GuessGameConfig::default()),
        surface.clone(),
    );
    surface
}

fn guess(value: &str) -> GameAction {
    GameAction::SubmitGuess(value.to_string())
}

// ============================================================================
// Engine
// ============================================================================

#[test]
fn test_binary_search_walkthrough() {
    let mut session = GuessSession::with_secret(1, 100, 42, GuessTuning::default()).unwrap();

    assert_eq!(session.submit_guess(50).unwrap().outcome, Outcome::TooHigh);
    assert_eq!(session.submit_guess(25).unwrap().outcome, Outcome::TooLow);
    assert_eq!(session.submit_guess(37).unwrap().outcome, Outcome::TooLow);
    assert_eq!(session.submit_guess(43).unwrap().outcome, Outcome::TooHigh);

    let win = session.submit_guess(42).unwrap();
    assert_eq!(win.outcome, Outcome::Correct);
    assert_eq!(win.attempts, 5);
    assert_eq!(win.rating, Some(Rating::Optimal));
    assert_eq!(session.status(), Status::Won);
    assert_eq!(session.revealed_secret(), Some(42));

    // terminal rounds reject further play
    assert!(session.submit_guess(42).is_err());
    assert!(session.request_hint().is_err());
}

// ============================================================================
// Registry + dialogue
// ============================================================================

#[tokio::test]
async fn test_full_round_through_registry() {
    let registry = SessionRegistry::<GuessDialogue>::new();
    open_round(&registry, 10, 42);

    match registry.deliver(10, PLAYER, GameAction::Hint).await.unwrap() {
        GameReply::Notice(panel) => assert!(panel.content.unwrap().contains("even")),
        other => panic!("unexpected reply {other:?}"),
    }

    match registry.deliver(10, PLAYER, guess("70")).await.unwrap() {
        GameReply::UpdateWithNotice(panel, _) => {
            assert_eq!(panel.button_ids(), vec![GUESS, HINT, SURRENDER]);
            assert!(panel.embed.unwrap().description.contains("**Attempts:** 1"));
        }
        other => panic!("unexpected reply {other:?}"),
    }

    match registry.deliver(10, PLAYER, guess("42")).await.unwrap() {
        GameReply::UpdateWithNotice(panel, notice) => {
            assert_eq!(panel.button_ids(), vec![REPLAY, END]);
            assert!(notice.content.unwrap().contains("2 attempts"));
        }
        other => panic!("unexpected reply {other:?}"),
    }

    let end = registry.deliver(10, PLAYER, GameAction::End).await.unwrap();
    assert!(matches!(end, GameReply::Update(ref panel) if panel.buttons.is_empty()));

    tokio::task::yield_now().await;
    assert!(!registry.is_open(10));
    assert_eq!(
        registry.deliver(10, PLAYER, GameAction::Replay).await,
        Err(DeliveryError::NoSession)
    );
}

#[tokio::test]
async fn test_bystander_cannot_play() {
    let registry = SessionRegistry::<GuessDialogue>::new();
    open_round(&registry, 11, 42);

    assert_eq!(
        registry.deliver(11, BYSTANDER, guess("42")).await,
        Err(DeliveryError::NotOwner)
    );

    // the bystander's guess was never counted
    match registry.deliver(11, PLAYER, guess("10")).await.unwrap() {
        GameReply::UpdateWithNotice(panel, _) => {
            assert!(panel.embed.unwrap().description.contains("**Attempts:** 1"))
        }
        other => panic!("unexpected reply {other:?}"),
    }
}

#[tokio::test]
async fn test_lobby_launch_through_registry() {
    let registry = SessionRegistry::<GuessDialogue>::new();
    let dialogue = GuessDialogue::new(10, 20, GuessGameConfig::default()).unwrap();
    registry.open(12, PLAYER, dialogue, Arc::new(Recorder::default()));

    match registry.deliver(12, PLAYER, GameAction::Launch).await.unwrap() {
        GameReply::Update(panel) => assert_eq!(panel.button_ids(), vec![GUESS, HINT, SURRENDER]),
        other => panic!("unexpected reply {other:?}"),
    }

    match registry.deliver(12, PLAYER, GameAction::Surrender).await.unwrap() {
        GameReply::Update(panel) => assert_eq!(panel.button_ids(), vec![REPLAY, END]),
        other => panic!("unexpected reply {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_idle_round_reveals_secret_on_expiry() {
    let registry = SessionRegistry::<GuessDialogue>::new();
    let surface = open_round(&registry, 13, 42);

    registry.deliver(13, PLAYER, guess("7")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(301)).await;

    assert!(!registry.is_open(13));
    let expired = surface.expired.lock().await;
    assert_eq!(expired.len(), 1);
    match &expired[0] {
        GameReply::Update(panel) => {
            let description = &panel.embed.as_ref().unwrap().description;
            assert!(description.contains("42"));
            assert!(description.contains("**Attempts made:** 1"));
            assert!(panel.buttons.is_empty());
        }
        other => panic!("unexpected expiry {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_replay_screen_expires_without_buttons() {
    let registry = SessionRegistry::<GuessDialogue>::new();
    let surface = open_round(&registry, 14, 42);

    registry.deliver(14, PLAYER, guess("42")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(61)).await;

    assert!(!registry.is_open(14));
    let expired = surface.expired.lock().await;
    assert!(matches!(&expired[..], [GameReply::Update(panel)] if panel.buttons.is_empty()));
}
