//! Configuration module - environment variable parsing

use std::env;

use crate::game::arena::ArenaConfig;
use crate::util::time::unix_millis;

/// Demo runner configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Match RNG seed; defaults to the current time for a fresh fight
    pub seed: u64,
    /// Loadout id for the player slot
    pub player_loadout: String,
    /// Loadout id for the opponent slot
    pub opponent_loadout: String,
    /// Arena override as "loop,dash,inner,outer" radii; `None` uses the
    /// default arena
    pub arena: Option<ArenaConfig>,
    /// Hard cap on the demo's simulated duration, in seconds
    pub max_match_secs: f64,
    /// Pace frames against the wall clock instead of free-running
    pub realtime: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let seed = match env::var("MATCH_SEED") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("MATCH_SEED"))?,
            Err(_) => unix_millis(),
        };

        let arena = match env::var("ARENA_RADII") {
            Ok(raw) => Some(parse_arena_radii(&raw)?),
            Err(_) => None,
        };

        let max_match_secs = match env::var("MAX_MATCH_SECS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("MAX_MATCH_SECS"))?,
            Err(_) => 180.0,
        };

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            seed,
            player_loadout: env::var("PLAYER_LOADOUT").unwrap_or_else(|_| "attack".to_string()),
            opponent_loadout: env::var("OPPONENT_LOADOUT")
                .unwrap_or_else(|_| "defense".to_string()),
            arena,
            max_match_secs,
            realtime: env::var("REALTIME")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

/// Parse an arena override of the form "120,170,210,250": the normal-loop,
/// charge-dash, inner, and outer radii around a centered arena
fn parse_arena_radii(raw: &str) -> Result<ArenaConfig, ConfigError> {
    let radii: Vec<f32> = raw
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|_| ConfigError::InvalidArenaRadii)?;
    let [normal_loop, charge_dash, inner, outer] = radii[..] else {
        return Err(ConfigError::InvalidArenaRadii);
    };
    Ok(ArenaConfig {
        center_x: 0.0,
        center_y: 0.0,
        normal_loop_radius: normal_loop,
        charge_dash_radius: charge_dash,
        inner_radius: inner,
        outer_radius: outer,
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable {0} is not a valid number")]
    InvalidNumber(&'static str),

    #[error("ARENA_RADII must be four comma-separated radii")]
    InvalidArenaRadii,
}
