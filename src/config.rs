use crate::matching::FallbackPolicy;
use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub schema_path: String,
    pub seed_path: String,
    pub seed_demo_data: bool,
    pub bind_addr: SocketAddr,
    pub max_workers: usize,
    /// How many listings the matcher ranks per chat message.
    pub match_top_n: usize,
    /// How many of those are sent back for display.
    pub display_top_n: usize,
    pub match_fallback: FallbackPolicy,
    pub max_body_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "housing.sqlite3".to_string(),
            schema_path: "sql/schema.sql".to_string(),
            seed_path: "sql/seed.sql".to_string(),
            seed_demo_data: false,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_workers: 8,
            match_top_n: 5,
            display_top_n: 3,
            match_fallback: FallbackPolicy::Recency,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = Config::default();

        let config = Self {
            database_path: env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            schema_path: env::var("SCHEMA_PATH").unwrap_or(defaults.schema_path),
            seed_path: env::var("SEED_PATH").unwrap_or(defaults.seed_path),
            seed_demo_data: parse_var("SEED_DEMO_DATA", defaults.seed_demo_data, parse_bool)?,
            bind_addr: parse_var("BIND_ADDR", defaults.bind_addr, SocketAddr::from_str)
                .context("BIND_ADDR must be host:port")?,
            max_workers: parse_var("MAX_WORKERS", defaults.max_workers, usize::from_str)?,
            match_top_n: parse_var("MATCH_TOP_N", defaults.match_top_n, usize::from_str)?,
            display_top_n: parse_var("DISPLAY_TOP_N", defaults.display_top_n, usize::from_str)?,
            match_fallback: parse_var("MATCH_FALLBACK", defaults.match_fallback, FallbackPolicy::from_str)?,
            max_body_bytes: parse_var("MAX_BODY_BYTES", defaults.max_body_bytes, u64::from_str)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            bail!("MAX_WORKERS must be at least 1");
        }
        if self.match_top_n == 0 || self.display_top_n == 0 {
            bail!("MATCH_TOP_N and DISPLAY_TOP_N must be at least 1");
        }
        Ok(())
    }
}

/// Reads `name`, falling back to `default` when unset. A set but
/// unparseable value is an error, never silently ignored.
fn parse_var<T, E, F>(name: &str, default: T, parse: F) -> Result<T>
where
    F: FnOnce(&str) -> std::result::Result<T, E>,
    E: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => parse(raw.trim()).map_err(|e| anyhow::anyhow!("{name}={raw:?} is invalid: {e}")),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(e).with_context(|| format!("{name} is not valid unicode")),
    }
}

pub(crate) fn parse_bool(raw: &str) -> std::result::Result<bool, String> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(format!("expected a boolean, got `{other}`")),
    }
}
