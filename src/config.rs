//! # Configuration Module
//!
//! This module defines configuration structures for the bot: credentials,
//! external API endpoints, HTTP timeouts and the daily notification schedule.
//! Values are read from the environment (a `.env` file is loaded in `main`).

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Constants for configuration defaults
pub const DEFAULT_FAVORITES_PATH: &str = "favorites.json";
pub const DEFAULT_CURRENCY: &str = "rub";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_REFERENCE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_NOTIFY_HOUR_UTC: u32 = 7;
pub const DEFAULT_NOTIFY_MINUTE_UTC: u32 = 0;
pub const DEFAULT_TRAVELPAYOUTS_BASE_URL: &str = "https://api.travelpayouts.com";
pub const DEFAULT_AVIATIONSTACK_BASE_URL: &str = "http://api.aviationstack.com";

/// External endpoints consumed by the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    /// Cheapest tickets search
    pub cheap: String,
    /// Daily price calendar
    pub calendar: String,
    /// Monthly minimum prices
    pub monthly: String,
    /// Popular directions of an airline
    pub airline_directions: String,
    /// Reference list of cities
    pub cities: String,
    /// Reference list of airlines
    pub airlines: String,
    /// Reference list of aircraft types
    pub aircraft: String,
    /// Live flight status
    pub flights: String,
}

impl ApiEndpoints {
    /// Build every endpoint from the two provider base URLs
    ///
    /// Trailing slashes are ignored, so `http://127.0.0.1:1234/` and
    /// `http://127.0.0.1:1234` produce the same endpoints.
    pub fn from_base_urls(travelpayouts: &str, aviationstack: &str) -> Self {
        let tp = travelpayouts.trim_end_matches('/');
        let avs = aviationstack.trim_end_matches('/');
        Self {
            cheap: format!("{tp}/v1/prices/cheap"),
            calendar: format!("{tp}/v1/prices/calendar"),
            monthly: format!("{tp}/v1/prices/monthly"),
            airline_directions: format!("{tp}/v1/airline-directions"),
            cities: format!("{tp}/data/ru/cities.json"),
            airlines: format!("{tp}/data/ru/airlines.json"),
            aircraft: format!("{tp}/data/planes.json"),
            flights: format!("{avs}/v1/flights"),
        }
    }
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self::from_base_urls(DEFAULT_TRAVELPAYOUTS_BASE_URL, DEFAULT_AVIATIONSTACK_BASE_URL)
    }
}

/// Time of day (UTC) when the favorites check runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifySchedule {
    pub hour: u32,
    pub minute: u32,
}

impl Default for NotifySchedule {
    fn default() -> Self {
        Self {
            hour: DEFAULT_NOTIFY_HOUR_UTC,
            minute: DEFAULT_NOTIFY_MINUTE_UTC,
        }
    }
}

/// Configuration structure for the bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token
    pub telegram_token: String,
    /// Token for the fares API
    pub aviasales_token: String,
    /// Access key for the flight-status API
    pub aviationstack_key: String,
    /// Location of the favorites JSON document
    pub favorites_path: PathBuf,
    /// Currency code sent with every fare query
    pub currency: String,
    /// Timeout for search and status requests
    pub http_timeout: Duration,
    /// Timeout for reference data downloads
    pub reference_timeout: Duration,
    /// External endpoints
    pub endpoints: ApiEndpoints,
    /// Daily notification schedule
    pub schedule: NotifySchedule,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            telegram_token: String::new(),
            aviasales_token: String::new(),
            aviationstack_key: String::new(),
            favorites_path: PathBuf::from(DEFAULT_FAVORITES_PATH),
            currency: DEFAULT_CURRENCY.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            reference_timeout: Duration::from_secs(DEFAULT_REFERENCE_TIMEOUT_SECS),
            endpoints: ApiEndpoints::default(),
            schedule: NotifySchedule::default(),
        }
    }
}

impl BotConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let telegram_token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
        let aviasales_token =
            env::var("AVIASALES_API_TOKEN").context("AVIASALES_API_TOKEN must be set")?;
        let aviationstack_key =
            env::var("AVIATIONSTACK_API_KEY").context("AVIATIONSTACK_API_KEY must be set")?;

        let travelpayouts_base = env::var("TRAVELPAYOUTS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_TRAVELPAYOUTS_BASE_URL.to_string());
        let aviationstack_base = env::var("AVIATIONSTACK_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_AVIATIONSTACK_BASE_URL.to_string());

        let schedule = NotifySchedule {
            hour: parse_env("NOTIFY_HOUR_UTC", DEFAULT_NOTIFY_HOUR_UTC)?,
            minute: parse_env("NOTIFY_MINUTE_UTC", DEFAULT_NOTIFY_MINUTE_UTC)?,
        };
        if schedule.hour > 23 || schedule.minute > 59 {
            anyhow::bail!(
                "Invalid notification time {:02}:{:02}",
                schedule.hour,
                schedule.minute
            );
        }

        Ok(Self {
            telegram_token,
            aviasales_token,
            aviationstack_key,
            favorites_path: env::var("FAVORITES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.favorites_path),
            currency: env::var("CURRENCY").unwrap_or(defaults.currency),
            http_timeout: Duration::from_secs(parse_env(
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            reference_timeout: Duration::from_secs(parse_env(
                "REFERENCE_TIMEOUT_SECS",
                DEFAULT_REFERENCE_TIMEOUT_SECS,
            )?),
            endpoints: ApiEndpoints::from_base_urls(&travelpayouts_base, &aviationstack_base),
            schedule,
        })
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
