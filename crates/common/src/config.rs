use chrono::NaiveTime;

use crate::{Error, Result};

pub const DEFAULT_DATA_PROVIDER_URL: &str = "https://query1.finance.yahoo.com";

/// Process configuration loaded from environment variables at startup.
///
/// Scan parameters (tickers, SMA period, threshold) live in the scan file
/// pointed to by `scanner_config_path`, not here.
#[derive(Debug, Clone)]
pub struct Config {
    // Scan file
    pub scanner_config_path: String,

    // Schedule
    pub scan_time: NaiveTime,

    // Market data
    pub data_provider_base_url: String,
    pub data_provider_timeout_secs: u64,

    // Telegram
    pub telegram_token: Option<String>,
    pub telegram_chat_ids: Vec<i64>,
}

impl Config {
    /// Load from the process environment. Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let scan_time = match optional("SCAN_TIME") {
            Some(raw) => parse_scan_time(&raw)?,
            None => NaiveTime::from_hms_opt(9, 0, 0)
                .ok_or_else(|| Error::Config("invalid default scan time".into()))?,
        };

        let data_provider_timeout_secs = match optional("DATA_PROVIDER_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!(
                    "DATA_PROVIDER_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
                ))
            })?,
            None => 30,
        };

        let telegram_token = optional("TELEGRAM_TOKEN");
        let telegram_chat_ids = match optional("TELEGRAM_CHAT_IDS") {
            Some(raw) => parse_chat_ids(&raw)?,
            None => Vec::new(),
        };
        if telegram_token.is_some() && telegram_chat_ids.is_empty() {
            return Err(Error::Config(
                "TELEGRAM_CHAT_IDS is required when TELEGRAM_TOKEN is set".into(),
            ));
        }

        Ok(Config {
            scanner_config_path: optional("SCANNER_CONFIG_PATH")
                .unwrap_or_else(|| "config/scanner.toml".to_string()),
            scan_time,
            data_provider_base_url: optional("DATA_PROVIDER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_DATA_PROVIDER_URL.to_string()),
            data_provider_timeout_secs,
            telegram_token,
            telegram_chat_ids,
        })
    }
}

/// Parse a 24-hour `HH:MM` time.
pub fn parse_scan_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
        Error::Config(format!("invalid time '{raw}', expected HH:MM (e.g. 09:00, 14:30)"))
    })
}

fn parse_chat_ids(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|_| {
                Error::Config(format!("TELEGRAM_CHAT_IDS contains non-numeric ID: '{s}'"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.scanner_config_path, "config/scanner.toml");
        assert_eq!(cfg.scan_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(cfg.data_provider_base_url, DEFAULT_DATA_PROVIDER_URL);
        assert_eq!(cfg.data_provider_timeout_secs, 30);
        assert!(cfg.telegram_token.is_none());
    }

    #[test]
    fn parses_chat_ids_and_time() {
        let cfg = Config::from_lookup(lookup(&[
            ("SCAN_TIME", "14:30"),
            ("TELEGRAM_TOKEN", "abc"),
            ("TELEGRAM_CHAT_IDS", "1, -42"),
        ]))
        .unwrap();
        assert_eq!(cfg.scan_time, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
        assert_eq!(cfg.telegram_chat_ids, vec![1, -42]);
    }

    #[test]
    fn token_without_chat_ids_is_rejected() {
        let err = Config::from_lookup(lookup(&[("TELEGRAM_TOKEN", "abc")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn malformed_values_are_config_errors() {
        assert!(Config::from_lookup(lookup(&[("SCAN_TIME", "9am")])).is_err());
        assert!(Config::from_lookup(lookup(&[("TELEGRAM_CHAT_IDS", "12,x")])).is_err());
        assert!(Config::from_lookup(lookup(&[("DATA_PROVIDER_TIMEOUT_SECS", "-1")])).is_err());
    }
}
