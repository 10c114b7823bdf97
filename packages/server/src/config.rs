use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domains::intent::{RouterSettings, SiteLayout};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub data_dir: PathBuf,
    pub site_origin: String,
    pub available_years: Vec<i32>,
    pub excluded_year: i32,
    pub others_slugs: Vec<String>,
    pub oracle_interval: Duration,
    pub oracle_max_attempts: u32,
    pub oracle_retry_delay: Duration,
    pub oracle_attempt_timeout: Duration,
    pub duplicate_ttl: Duration,
    pub duplicate_capacity: usize,
    pub suggestion_cutoff: f64,
    pub resolve_timeout: Duration,
    pub audit_ledger_path: PathBuf,
    pub audit_enabled: bool,
    pub audit_queue_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));

        // Preview deployments and CI must never write to the ledger
        let audit_enabled = !flag("AUDIT_DISABLED") && !flag("IS_PULL_REQUEST");

        Ok(Self {
            port: parsed("PORT", 8080)?,
            gemini_api_key: env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?,
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| gemini_client::GEMINI_2_0_FLASH_LITE.to_string()),
            site_origin: env::var("SITE_ORIGIN")
                .unwrap_or_else(|_| "https://gbbinfo-jpn.onrender.com".to_string()),
            available_years: match env::var("AVAILABLE_YEARS") {
                Ok(raw) => parse_list(&raw).context("AVAILABLE_YEARS must be a comma separated list of years")?,
                Err(_) => (2017..=2025).collect(),
            },
            excluded_year: parsed("EXCLUDED_YEAR", 2022)?,
            others_slugs: match env::var("OTHERS_SLUGS") {
                Ok(raw) => parse_list(&raw).context("OTHERS_SLUGS must be a comma separated list")?,
                Err(_) => vec!["about".into(), "how_to_plan".into(), "7tosmoke".into()],
            },
            oracle_interval: Duration::from_millis(parsed("ORACLE_INTERVAL_MS", 2000)?),
            oracle_max_attempts: parsed("ORACLE_MAX_ATTEMPTS", 5)?,
            oracle_retry_delay: Duration::from_millis(parsed("ORACLE_RETRY_DELAY_MS", 2000)?),
            oracle_attempt_timeout: Duration::from_millis(parsed("ORACLE_ATTEMPT_TIMEOUT_MS", 15000)?),
            duplicate_ttl: Duration::from_secs(parsed("DUPLICATE_TTL_SECS", 60)?),
            duplicate_capacity: parsed("DUPLICATE_CAPACITY", 100)?,
            suggestion_cutoff: parsed("SUGGESTION_CUTOFF", 40.0)?,
            resolve_timeout: Duration::from_secs(parsed("RESOLVE_TIMEOUT_SECS", 60)?),
            audit_ledger_path: env::var("AUDIT_LEDGER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("audit.jsonl")),
            audit_enabled,
            audit_queue_capacity: parsed("AUDIT_QUEUE_CAPACITY", 256)?,
            data_dir,
        })
    }

    pub fn site_layout(&self) -> SiteLayout {
        SiteLayout {
            site_origin: self.site_origin.clone(),
            available_years: self.available_years.clone(),
            excluded_year: self.excluded_year,
            others_slugs: self.others_slugs.clone(),
        }
    }

    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            oracle_interval: self.oracle_interval,
            oracle_max_attempts: self.oracle_max_attempts,
            oracle_retry_delay: self.oracle_retry_delay,
            oracle_attempt_timeout: self.oracle_attempt_timeout,
            duplicate_ttl: self.duplicate_ttl,
            duplicate_capacity: self.duplicate_capacity,
            suggestion_cutoff: self.suggestion_cutoff,
            resolve_timeout: self.resolve_timeout,
        }
    }

    /// Path of the static question -> page table.
    pub fn intent_cache_path(&self) -> PathBuf {
        self.data_dir.join("intent_cache.json")
    }

    /// Directory holding `<year>.csv` participant seasons.
    pub fn participants_dir(&self) -> PathBuf {
        self.data_dir.join("participants")
    }
}

fn parsed<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid value", name)),
        Err(_) => Ok(default),
    }
}

fn flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn parse_list<T>(raw: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().with_context(|| format!("invalid list item: {}", s)))
        .collect()
}
