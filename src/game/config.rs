//! Game configuration with environment-variable overrides.
//!
//! Every override is parsed leniently: a missing or malformed value keeps the
//! default.

use std::time::Duration;

use crate::rules::clock::MAX_SECONDS;

pub const ENV_BOT_ENGINE: &str = "CHESSURANGA_BOT_ENGINE";
pub const ENV_BOT_THINK_MS: &str = "CHESSURANGA_BOT_THINK_MS";
pub const ENV_RESPAWN_DELAY_MS: &str = "CHESSURANGA_RESPAWN_DELAY_MS";
pub const ENV_SEED: &str = "CHESSURANGA_SEED";
pub const ENV_START_SECONDS: &str = "CHESSURANGA_START_SECONDS";

/// Ruleset chosen when a game starts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum GameMode {
    /// Two local players.
    #[strum(to_string = "standard", serialize = "pvp")]
    Standard,
    /// Light against a computer-controlled horde with extra lives.
    #[strum(to_string = "horde", serialize = "asura")]
    Horde,
}

/// Move oracles the horde can be driven by.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BotEngine {
    Greedy,
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Requested oracle name. Unknown names leave the oracle unavailable and
    /// the horde falls back to random moves.
    pub bot_engine: String,
    pub bot_think_time: Duration,
    pub respawn_delay: Duration,
    pub seed: Option<u64>,
    pub start_seconds: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            bot_engine: BotEngine::Greedy.to_string(),
            bot_think_time: Duration::from_millis(500),
            respawn_delay: Duration::from_millis(2000),
            seed: None,
            start_seconds: MAX_SECONDS,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in
    /// production).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed_u64 = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            bot_engine: lookup(ENV_BOT_ENGINE)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.bot_engine),
            bot_think_time: parsed_u64(ENV_BOT_THINK_MS)
                .map(Duration::from_millis)
                .unwrap_or(defaults.bot_think_time),
            respawn_delay: parsed_u64(ENV_RESPAWN_DELAY_MS)
                .map(Duration::from_millis)
                .unwrap_or(defaults.respawn_delay),
            seed: parsed_u64(ENV_SEED).or(defaults.seed),
            start_seconds: lookup(ENV_START_SECONDS)
                .and_then(|v| v.trim().parse::<u32>().ok())
                .map(|secs| secs.min(MAX_SECONDS))
                .unwrap_or(defaults.start_seconds),
        }
    }

    /// The requested engine, if the name is one we know.
    pub fn bot_engine_kind(&self) -> Option<BotEngine> {
        self.bot_engine.parse::<BotEngine>().ok()
    }
}
