//! # Feature: Guess The Number
//!
//! Game state for a single round of guess-the-number: the secret, the attempt
//! counter, the recent guesses and the round status. Pure and synchronous; the
//! dialogue layer feeds it validated input and renders what it returns.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Tuning constants moved to `GuessTuning` (configurable)
//! - 1.0.0: Initial release with hints, ratings and proximity bands

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Errors raised by round operations. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuessError {
    /// `min` must be strictly lower than `max`
    #[error("invalid range: minimum {min} must be lower than maximum {max}")]
    InvalidRange { min: i64, max: i64 },

    /// Guess outside the closed range; the round is left untouched
    #[error("{value} is outside the range {min}..={max}")]
    OutOfRange { value: i64, min: i64, max: i64 },

    /// The round already reached a terminal status
    #[error("the round is already over")]
    SessionTerminated,
}

/// Tuning constants for ratings, hints and history length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessTuning {
    /// Number of recent guesses kept
    #[serde(default = "default_history_len")]
    pub history_len: usize,

    /// Hint half-width is `(max - min) / hint_divisor`
    #[serde(default = "default_hint_divisor")]
    pub hint_divisor: u64,

    /// Attempts above the optimum still rated excellent
    #[serde(default = "default_excellent_margin")]
    pub excellent_margin: u32,

    /// Attempts above the optimum still rated good
    #[serde(default = "default_good_margin")]
    pub good_margin: u32,

    /// Attempts above the optimum still rated fair
    #[serde(default = "default_fair_margin")]
    pub fair_margin: u32,
}

fn default_history_len() -> usize {
    5
}

fn default_hint_divisor() -> u64 {
    10
}

fn default_excellent_margin() -> u32 {
    2
}

fn default_good_margin() -> u32 {
    5
}

fn default_fair_margin() -> u32 {
    10
}

impl Default for GuessTuning {
    fn default() -> Self {
        GuessTuning {
            history_len: default_history_len(),
            hint_divisor: default_hint_divisor(),
            excellent_margin: default_excellent_margin(),
            good_margin: default_good_margin(),
            fair_margin: default_fair_margin(),
        }
    }
}

/// Round status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    Won,
    Surrendered,
    TimedOut,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Active)
    }
}

/// How a guess compares to the secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    TooLow,
    TooHigh,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Correct => "✅ Correct",
            Outcome::TooLow => "🔽 Too low",
            Outcome::TooHigh => "🔼 Too high",
        }
    }
}

/// Qualitative rating of a win, relative to the binary-search optimum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Optimal,
    Excellent,
    Good,
    Fair,
    NeedsPractice,
}

impl Rating {
    pub fn message(&self) -> &'static str {
        match self {
            Rating::Optimal => "🌟 **Performance:** Outstanding! You found it in an optimal number of tries!",
            Rating::Excellent => "⭐ **Performance:** Excellent! Almost perfect!",
            Rating::Good => "👍 **Performance:** Good job!",
            Rating::Fair => "👌 **Performance:** Not bad, but you can do better!",
            Rating::NeedsPractice => "🙂 **Performance:** You made it, keep practicing!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    Even,
    Odd,
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parity::Even => write!(f, "even"),
            Parity::Odd => write!(f, "odd"),
        }
    }
}

/// What a hint request reveals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    /// First hint, before any guess
    Parity(Parity),
    /// Interval around the secret, clamped to the round range
    Window { low: i64, high: i64 },
    /// The range is too small for a useful interval
    Exhaustive,
}

impl Hint {
    pub fn message(&self) -> String {
        match self {
            Hint::Parity(parity) => format!("🧩 **Hint:** The number is **{parity}**."),
            Hint::Window { low, high } => {
                format!("🧩 **Hint:** The number is between **{low}** and **{high}**.")
            }
            Hint::Exhaustive => {
                "🧩 **Hint:** You're in a tiny range, just try every number!".to_string()
            }
        }
    }
}

/// Hot/cold band for the latest guess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proximity {
    VeryHot,
    Hot,
    Warm,
    Tepid,
    Cool,
    Cold,
    VeryCold,
}

impl Proximity {
    /// Maps a 0..=100 proximity score to its band
    pub fn from_score(score: f64) -> Self {
        if score >= 95.0 {
            Proximity::VeryHot
        } else if score >= 85.0 {
            Proximity::Hot
        } else if score >= 70.0 {
            Proximity::Warm
        } else if score >= 50.0 {
            Proximity::Tepid
        } else if score >= 30.0 {
            Proximity::Cool
        } else if score >= 15.0 {
            Proximity::Cold
        } else {
            Proximity::VeryCold
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Proximity::VeryHot => "🔥 **Burning!** You're almost there!",
            Proximity::Hot => "🔥 **Very hot!** Getting closer!",
            Proximity::Warm => "♨️ **Hot!** Keep going this way!",
            Proximity::Tepid => "🌡️ **Warm.** You're on the right track.",
            Proximity::Cool => "❄️ **Cool.** Drifting away a little.",
            Proximity::Cold => "❄️ **Cold!** You're far off.",
            Proximity::VeryCold => "🧊 **Freezing!** You're very far away.",
        }
    }
}

/// One entry of the guess history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessRecord {
    pub value: i64,
    pub outcome: Outcome,
}

/// Result of an accepted guess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessResult {
    pub outcome: Outcome,
    pub attempts: u32,
    /// Present only when the guess won the round
    pub rating: Option<Rating>,
}

/// Secret and attempt count revealed at the end of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reveal {
    pub secret: i64,
    pub attempts: u32,
}

/// A single guess-the-number round
#[derive(Debug, Clone)]
pub struct GuessSession {
    secret: i64,
    min: i64,
    max: i64,
    attempts: u32,
    history: VecDeque<GuessRecord>,
    status: Status,
    tuning: GuessTuning,
}

impl GuessSession {
    /// Starts a round with a secret drawn from the thread-local RNG
    pub fn new(min: i64, max: i64, tuning: GuessTuning) -> Result<Self, GuessError> {
        Self::with_rng(min, max, tuning, &mut rand::rng())
    }

    /// Starts a round with a secret drawn uniformly from `rng`
    pub fn with_rng<R: Rng>(
        min: i64,
        max: i64,
        tuning: GuessTuning,
        rng: &mut R,
    ) -> Result<Self, GuessError> {
        check_range(min, max)?;
        let secret = rng.random_range(min..=max);
        Ok(Self::build(min, max, secret, tuning))
    }

    /// Starts a round with a known secret
    pub fn with_secret(
        min: i64,
        max: i64,
        secret: i64,
        tuning: GuessTuning,
    ) -> Result<Self, GuessError> {
        check_range(min, max)?;
        if secret < min || secret > max {
            return Err(GuessError::OutOfRange {
                value: secret,
                min,
                max,
            });
        }
        Ok(Self::build(min, max, secret, tuning))
    }

    fn build(min: i64, max: i64, secret: i64, tuning: GuessTuning) -> Self {
        GuessSession {
            secret,
            min,
            max,
            attempts: 0,
            history: VecDeque::with_capacity(tuning.history_len + 1),
            status: Status::Active,
            tuning,
        }
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Most recent guess first
    pub fn history(&self) -> impl Iterator<Item = &GuessRecord> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// The secret, only once the round is over
    pub fn revealed_secret(&self) -> Option<i64> {
        self.status.is_terminal().then_some(self.secret)
    }

    #[cfg(test)]
    pub(crate) fn secret(&self) -> i64 {
        self.secret
    }

    fn ensure_active(&self) -> Result<(), GuessError> {
        if self.status.is_terminal() {
            return Err(GuessError::SessionTerminated);
        }
        Ok(())
    }

    /// Scores one guess. Out-of-range values leave the round untouched.
    pub fn submit_guess(&mut self, value: i64) -> Result<GuessResult, GuessError> {
        self.ensure_active()?;
        if value < self.min || value > self.max {
            return Err(GuessError::OutOfRange {
                value,
                min: self.min,
                max: self.max,
            });
        }

        self.attempts += 1;
        let outcome = match value.cmp(&self.secret) {
            std::cmp::Ordering::Equal => Outcome::Correct,
            std::cmp::Ordering::Less => Outcome::TooLow,
            std::cmp::Ordering::Greater => Outcome::TooHigh,
        };

        self.history.push_front(GuessRecord { value, outcome });
        self.history.truncate(self.tuning.history_len);

        let rating = if outcome == Outcome::Correct {
            self.status = Status::Won;
            Some(self.rating())
        } else {
            None
        };

        Ok(GuessResult {
            outcome,
            attempts: self.attempts,
            rating,
        })
    }

    /// Hint for the current round; never mutates it
    pub fn request_hint(&self) -> Result<Hint, GuessError> {
        self.ensure_active()?;
        if self.history.is_empty() {
            let parity = if self.secret % 2 == 0 {
                Parity::Even
            } else {
                Parity::Odd
            };
            return Ok(Hint::Parity(parity));
        }

        let half_width = self.max.abs_diff(self.min) / self.tuning.hint_divisor.max(1);
        if half_width == 0 {
            return Ok(Hint::Exhaustive);
        }

        let half_width = i64::try_from(half_width).unwrap_or(i64::MAX);
        Ok(Hint::Window {
            low: self.secret.saturating_sub(half_width).max(self.min),
            high: self.secret.saturating_add(half_width).min(self.max),
        })
    }

    pub fn surrender(&mut self) -> Result<Reveal, GuessError> {
        self.ensure_active()?;
        self.status = Status::Surrendered;
        Ok(self.reveal())
    }

    /// Times the round out. Returns `false` when it was already over.
    pub fn expire(&mut self) -> bool {
        if self.status != Status::Active {
            return false;
        }
        self.status = Status::TimedOut;
        true
    }

    pub fn reveal(&self) -> Reveal {
        Reveal {
            secret: self.secret,
            attempts: self.attempts,
        }
    }

    /// Hot/cold band of the latest guess, `None` before the first guess
    pub fn proximity(&self) -> Option<Proximity> {
        let last = self.history.front()?;
        let range = self.max.abs_diff(self.min) as f64;
        let distance = last.value.abs_diff(self.secret) as f64;
        let score = 100.0 - (distance / range * 100.0).min(100.0);
        Some(Proximity::from_score(score))
    }

    /// Fewest attempts that always suffice with a binary search
    pub fn optimal_attempts(&self) -> u32 {
        ceil_log2(self.max.abs_diff(self.min))
    }

    fn rating(&self) -> Rating {
        let optimum = self.optimal_attempts();
        let attempts = self.attempts;
        if attempts <= optimum {
            Rating::Optimal
        } else if attempts <= optimum + self.tuning.excellent_margin {
            Rating::Excellent
        } else if attempts <= optimum + self.tuning.good_margin {
            Rating::Good
        } else if attempts <= optimum + self.tuning.fair_margin {
            Rating::Fair
        } else {
            Rating::NeedsPractice
        }
    }
}

fn check_range(min: i64, max: i64) -> Result<(), GuessError> {
    if min >= max {
        return Err(GuessError::InvalidRange { min, max });
    }
    Ok(())
}

fn ceil_log2(value: u64) -> u32 {
    if value <= 1 {
        0
    } else {
        u64::BITS - (value - 1).leading_zeros()
    }
}
