//! Environment-driven settings shared by the terminal client and the bindings.

use anyhow::{Result, anyhow};
use log::LevelFilter;

use crate::food::openfoodfacts::DEFAULT_BASE_URL;
use crate::logging::parse_level;

pub const DEFAULT_DATABASE_URL: &str = "kinetic.db";
pub const DEFAULT_USER_AGENT: &str = concat!("kinetic/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Path of the SQLite database file.
    pub database_url: String,
    pub food_api_base_url: String,
    pub food_api_user_agent: String,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            food_api_base_url: DEFAULT_BASE_URL.to_string(),
            food_api_user_agent: DEFAULT_USER_AGENT.to_string(),
            log_level: LevelFilter::Warn,
        }
    }
}

impl Config {
    /// Reads `DATABASE_URL`, `FOOD_API_BASE_URL`, `FOOD_API_USER_AGENT` and
    /// `KINETIC_LOG` (falling back to `RUST_LOG`). Unset variables keep their
    /// defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url.trim_start_matches("sqlite://").to_string();
        }
        if let Some(url) = get("FOOD_API_BASE_URL") {
            config.food_api_base_url = url;
        }
        if let Some(agent) = get("FOOD_API_USER_AGENT") {
            config.food_api_user_agent = agent;
        }
        if let Some(level) = get("KINETIC_LOG").or_else(|| get("RUST_LOG")) {
            config.log_level = parse_level(&level)
                .ok_or_else(|| anyhow!("Invalid log level '{}'", level))?;
        }

        Ok(config)
    }
}
