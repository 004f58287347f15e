use std::env;
use std::str::FromStr;

use game_core::DEFAULT_MAX_GAMES_PER_DAY;
use game_persistence::connection::DEFAULT_DATABASE_URL;

pub const DEV_JWT_SECRET: &str = "guessword-dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub max_games_per_day: u32,
    pub maintenance_interval_seconds: u64,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid value '{value}' for {var}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_var(&lookup, "PORT", 8080)?,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            jwt_secret: lookup("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            token_ttl_minutes: parse_var(&lookup, "TOKEN_TTL_MINUTES", 720)?,
            max_games_per_day: parse_var(&lookup, "MAX_GAMES_PER_DAY", DEFAULT_MAX_GAMES_PER_DAY)?,
            maintenance_interval_seconds: parse_var(&lookup, "MAINTENANCE_INTERVAL_SECONDS", 60)?,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError { var, value }),
        None => Ok(default),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_minutes: 720,
            max_games_per_day: DEFAULT_MAX_GAMES_PER_DAY,
            maintenance_interval_seconds: 60,
        }
    }
}
