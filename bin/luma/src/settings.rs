//! Runtime settings derived from environment variables (and `.env`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use luma_core::StoreSettings;

/// Longest story lifetime accepted from configuration: one year.
const MAX_STORY_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP bind address, e.g. `127.0.0.1:8080`.
    pub bind: String,
    /// Root directory for the local file backend.
    pub storage_dir: PathBuf,
    /// Connection string for the SQLite backend.
    pub database_url: String,
    pub store: StoreSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let refresh_ms: u64 = var("LUMA_REFRESH_DELAY_MS", "1000")
            .parse()
            .context("LUMA_REFRESH_DELAY_MS must be a whole number of milliseconds")?;
        let story_ttl_hours: i64 = var("LUMA_STORY_TTL_HOURS", "24")
            .parse()
            .context("LUMA_STORY_TTL_HOURS must be a whole number of hours")?;
        if !(1..=MAX_STORY_TTL_HOURS).contains(&story_ttl_hours) {
            bail!("LUMA_STORY_TTL_HOURS must be between 1 and {MAX_STORY_TTL_HOURS}, got {story_ttl_hours}");
        }
        let story_ttl = chrono::Duration::try_hours(story_ttl_hours)
            .context("LUMA_STORY_TTL_HOURS is out of range")?;

        Ok(Self {
            bind: var("LUMA_BIND", "127.0.0.1:8080"),
            storage_dir: PathBuf::from(var("LUMA_STORAGE_DIR", "./data/kv")),
            database_url: var("LUMA_DATABASE_URL", "sqlite:luma.db"),
            store: StoreSettings {
                refresh_delay: Duration::from_millis(refresh_ms),
                story_ttl,
            },
        })
    }
}
