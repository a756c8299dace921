//! Environment-driven configuration

use crate::conversation::Language;
use crate::streaming::DEFAULT_BASE_DELAY;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_HOMESTAY_API_URL: &str = "http://127.0.0.1:3000/api";
pub const DEFAULT_BOT_NAME: &str = "Sari";
pub const DEFAULT_THEME: &str = "forest";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// Upper bound on a single collaborator call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid value for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    /// Absent key means every generation turn answers with setup instructions
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    /// Override of the Gemini API root, e.g. for a gateway
    pub gemini_base_url: Option<String>,
    pub homestay_api_url: String,
    pub bot_name: String,
    pub language: Language,
    pub theme: String,
    pub reveal_delay: Duration,
    pub port: u16,
    /// Untouched conversations are dropped after this long; `None` keeps them forever
    pub idle_ttl: Option<Duration>,
}

impl AssistantConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let language = match get("CONCIERGE_LANGUAGE") {
            Some(raw) => raw.parse::<Language>().map_err(|reason| ConfigError {
                var: "CONCIERGE_LANGUAGE",
                reason,
            })?,
            None => Language::default(),
        };

        let reveal_delay = match get("CONCIERGE_REVEAL_DELAY_MS") {
            Some(raw) => Duration::from_millis(raw.parse::<u64>().map_err(|e| ConfigError {
                var: "CONCIERGE_REVEAL_DELAY_MS",
                reason: e.to_string(),
            })?),
            None => DEFAULT_BASE_DELAY,
        };

        let port = match get("CONCIERGE_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError {
                var: "CONCIERGE_PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let idle_ttl = match get("CONCIERGE_IDLE_TTL_SECS") {
            Some(raw) => match raw.parse::<u64>().map_err(|e| ConfigError {
                var: "CONCIERGE_IDLE_TTL_SECS",
                reason: e.to_string(),
            })? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            None => Some(DEFAULT_IDLE_TTL),
        };

        Ok(Self {
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: get("GEMINI_BASE_URL"),
            homestay_api_url: get("HOMESTAY_API_URL")
                .unwrap_or_else(|| DEFAULT_HOMESTAY_API_URL.to_string()),
            bot_name: get("CONCIERGE_BOT_NAME").unwrap_or_else(|| DEFAULT_BOT_NAME.to_string()),
            language,
            theme: get("CONCIERGE_THEME").unwrap_or_else(|| DEFAULT_THEME.to_string()),
            reveal_delay,
            port,
            idle_ttl,
        })
    }
}
