//! # Feature: Configuration System
//!
//! Bot settings from a YAML file (with `${VAR}` interpolation) or from plain
//! environment variables.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Game, panel and welcome sections; single bot per process
//! - 2.0.0: YAML configuration with environment interpolation
//! - 1.0.0: Initial environment variable configuration

use crate::games::guess_number::GuessTuning;
use anyhow::{Context, Result};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Sections
// ============================================================================

/// `/guess-the-number` defaults and idle budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessGameConfig {
    #[serde(default = "default_min")]
    pub default_min: i64,

    #[serde(default = "default_max")]
    pub default_max: i64,

    #[serde(default = "default_lobby_timeout")]
    pub lobby_timeout_secs: u64,

    #[serde(default = "default_round_timeout")]
    pub round_timeout_secs: u64,

    #[serde(default = "default_replay_timeout")]
    pub replay_timeout_secs: u64,

    #[serde(default)]
    pub tuning: GuessTuning,
}

impl Default for GuessGameConfig {
    fn default() -> Self {
        GuessGameConfig {
            default_min: default_min(),
            default_max: default_max(),
            lobby_timeout_secs: default_lobby_timeout(),
            round_timeout_secs: default_round_timeout(),
            replay_timeout_secs: default_replay_timeout(),
            tuning: GuessTuning::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamesConfig {
    #[serde(default)]
    pub guess_the_number: GuessGameConfig,
}

/// How long stateless panels keep their buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_secs: u64,

    #[serde(default = "default_rename_timeout")]
    pub rename_timeout_secs: u64,

    #[serde(default = "default_salon_timeout")]
    pub salon_timeout_secs: u64,

    #[serde(default = "default_welcome_timeout")]
    pub welcome_timeout_secs: u64,
}

impl PanelConfig {
    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs)
    }

    pub fn rename_timeout(&self) -> Duration {
        Duration::from_secs(self.rename_timeout_secs)
    }

    pub fn salon_timeout(&self) -> Duration {
        Duration::from_secs(self.salon_timeout_secs)
    }

    pub fn welcome_timeout(&self) -> Duration {
        Duration::from_secs(self.welcome_timeout_secs)
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            ping_timeout_secs: default_ping_timeout(),
            rename_timeout_secs: default_rename_timeout(),
            salon_timeout_secs: default_salon_timeout(),
            welcome_timeout_secs: default_welcome_timeout(),
        }
    }
}

/// Delivery of welcome messages on member join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeDeliveryConfig {
    #[serde(default = "default_send_attempts")]
    pub send_attempts: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for WelcomeDeliveryConfig {
    fn default() -> Self {
        WelcomeDeliveryConfig {
            send_attempts: default_send_attempts(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

// ============================================================================
// Bot Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Discord bot token (required)
    pub discord_token: String,

    /// Dev mode guild ID (commands registered to this guild only)
    #[serde(default)]
    pub discord_guild_id: Option<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How often the "Watching N servers" activity is refreshed
    #[serde(default = "default_presence_refresh")]
    pub presence_refresh_minutes: u64,

    #[serde(default)]
    pub games: GamesConfig,

    #[serde(default)]
    pub panels: PanelConfig,

    #[serde(default)]
    pub welcome: WelcomeDeliveryConfig,
}

// Default value functions for serde
fn default_log_level() -> String {
    "info".to_string()
}

fn default_presence_refresh() -> u64 {
    30
}

fn default_min() -> i64 {
    1
}

fn default_max() -> i64 {
    100
}

fn default_lobby_timeout() -> u64 {
    120
}

fn default_round_timeout() -> u64 {
    300
}

fn default_replay_timeout() -> u64 {
    60
}

fn default_ping_timeout() -> u64 {
    60
}

fn default_rename_timeout() -> u64 {
    180
}

fn default_salon_timeout() -> u64 {
    60
}

fn default_welcome_timeout() -> u64 {
    60
}

fn default_send_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN environment variable not set"))?,
            discord_guild_id: env::var("DISCORD_GUILD_ID").ok(),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| default_log_level()),
            presence_refresh_minutes: env::var("PRESENCE_REFRESH_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_presence_refresh),
            games: GamesConfig::default(),
            panels: PanelConfig::default(),
            welcome: WelcomeDeliveryConfig::default(),
        })
    }

    /// Load configuration from a YAML file with environment variable interpolation
    ///
    /// Supports `${VAR_NAME}` and `${VAR_NAME:-default}`.
    /// Example: `discord_token: "${DISCORD_TOKEN}"`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let interpolated = interpolate_env_vars(content)?;
        let config: Config =
            serde_yaml::from_str(&interpolated).context("Failed to parse YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect and load configuration
    ///
    /// Priority order:
    /// 1. If CONFIG_FILE env var is set, load from that file
    /// 2. If config.yaml exists in current directory, load from it
    /// 3. Fall back to environment variables
    pub fn auto_load() -> Result<Self> {
        if let Ok(config_path) = env::var("CONFIG_FILE") {
            info!("Loading config from CONFIG_FILE: {}", config_path);
            return Self::from_file(&config_path);
        }

        let default_config_path = "config.yaml";
        if Path::new(default_config_path).exists() {
            info!("Loading config from {}", default_config_path);
            return Self::from_file(default_config_path);
        }

        info!("No config file found, using environment variables");
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("discord_token is required");
        }

        if self.presence_refresh_minutes == 0 {
            anyhow::bail!("presence_refresh_minutes must be positive");
        }

        let game = &self.games.guess_the_number;
        if game.default_min >= game.default_max {
            anyhow::bail!(
                "games.guess_the_number: default_min ({}) must be lower than default_max ({})",
                game.default_min,
                game.default_max
            );
        }

        if game.lobby_timeout_secs == 0
            || game.round_timeout_secs == 0
            || game.replay_timeout_secs == 0
        {
            anyhow::bail!("games.guess_the_number: timeouts must be positive");
        }

        let tuning = &game.tuning;
        if tuning.history_len == 0 {
            anyhow::bail!("games.guess_the_number.tuning: history_len must be positive");
        }
        if tuning.hint_divisor == 0 {
            anyhow::bail!("games.guess_the_number.tuning: hint_divisor must be positive");
        }
        if !(tuning.excellent_margin < tuning.good_margin
            && tuning.good_margin < tuning.fair_margin)
        {
            anyhow::bail!(
                "games.guess_the_number.tuning: margins must increase (excellent {} < good {} < fair {})",
                tuning.excellent_margin,
                tuning.good_margin,
                tuning.fair_margin
            );
        }

        let panels = &self.panels;
        if [
            panels.ping_timeout_secs,
            panels.rename_timeout_secs,
            panels.salon_timeout_secs,
            panels.welcome_timeout_secs,
        ]
        .contains(&0)
        {
            anyhow::bail!("panels: timeouts must be positive");
        }

        if self.welcome.send_attempts == 0 {
            anyhow::bail!("welcome.send_attempts must be at least 1");
        }

        Ok(())
    }

    /// Whether commands go to a single dev guild
    pub fn dev_guild(&self) -> Option<u64> {
        self.discord_guild_id
            .as_deref()
            .and_then(|id| id.trim().parse().ok())
    }
}

// ============================================================================
// Environment Variable Interpolation
// ============================================================================

// Pattern: ${VAR_NAME} or ${VAR_NAME:-default}
static ENV_VAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("Invalid regex")
});

/// Interpolate environment variables in a string
///
/// Supports `${VAR_NAME}` syntax. If a variable is not set, returns an error.
/// Use `${VAR_NAME:-default}` for default values.
fn interpolate_env_vars(content: &str) -> Result<String> {
    let mut errors = Vec::new();

    let result = ENV_VAR.replace_all(content, |cap: &regex::Captures| {
        let var_name = &cap[1];
        match env::var(var_name) {
            Ok(v) => v,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    errors.push(format!("Environment variable '{}' is not set", var_name));
                    String::new()
                }
            },
        }
    });

    if !errors.is_empty() {
        anyhow::bail!("Missing environment variables:\n  - {}", errors.join("\n  - "));
    }

    Ok(result.into_owned())
}

// ============================================================================
// Tests
// ============================================================================
