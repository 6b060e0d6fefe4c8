use std::{path::PathBuf, str::FromStr, time::Duration};

use kos_http::{KosError, DEFAULT_TOKEN_KEY};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Runtime settings, usually taken from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url:    String,
    pub token_file:      PathBuf,
    pub token_key:       String,
    pub http_timeout:    Duration,
    pub refresh_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url:    DEFAULT_API_BASE_URL.into(),
            token_file:      PathBuf::from("kos_taxi_tokens.json"),
            token_key:       DEFAULT_TOKEN_KEY.into(),
            http_timeout:    Duration::from_secs(10),
            refresh_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Reads `.env` if present, then the `KOS_*` variables.
    pub fn from_env() -> Result<Self, KosError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, KosError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        Ok(Self {
            api_base_url: get("KOS_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_owned())
                .unwrap_or(defaults.api_base_url),
            token_file: get("KOS_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.token_file),
            token_key: get("KOS_TOKEN_KEY").unwrap_or(defaults.token_key),
            http_timeout: match get("KOS_HTTP_TIMEOUT_SECS") {
                Some(raw) => Duration::from_secs(parse("KOS_HTTP_TIMEOUT_SECS", &raw)?),
                None => defaults.http_timeout,
            },
            refresh_timeout: match get("KOS_REFRESH_TIMEOUT_SECS") {
                Some(raw) => Duration::from_secs(parse("KOS_REFRESH_TIMEOUT_SECS", &raw)?),
                None => defaults.refresh_timeout,
            },
        })
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, KosError> {
    raw.parse()
        .map_err(|_| KosError::Config(format!("{key}={raw:?} is not a valid number")))
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
    fn defaults_when_nothing_is_set() {
        let cfg = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.api_base_url, "http://localhost:5000/api");
        assert_eq!(cfg.token_key, "kos_taxi_driver_tokens");
        assert_eq!(cfg.refresh_timeout, Duration::from_secs(10));
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let cfg = ClientConfig::from_lookup(lookup(&[
            ("KOS_API_BASE_URL", "https://taxi.example.hr/api/"),
            ("KOS_REFRESH_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(cfg.api_base_url, "https://taxi.example.hr/api");
        assert_eq!(cfg.refresh_timeout, Duration::from_secs(3));
    }

    #[test]
    fn bad_timeout_is_a_config_error() {
        let err = ClientConfig::from_lookup(lookup(&[("KOS_HTTP_TIMEOUT_SECS", "ten")])).unwrap_err();
        assert!(matches!(err, KosError::Config(_)));
    }
}
