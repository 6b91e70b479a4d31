// Client configuration, loaded from the environment by the CLI
use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "https://v2.api.noroff.dev";
pub const DEFAULT_SESSION_PATH: &str = ".holidaze/session.json";

pub const BASE_URL_VAR: &str = "HOLIDAZE_API_URL";
pub const API_KEY_VAR: &str = "HOLIDAZE_API_KEY";
pub const TIMEOUT_VAR: &str = "HOLIDAZE_TIMEOUT_MS";
pub const SESSION_PATH_VAR: &str = "HOLIDAZE_SESSION_PATH";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    // Sent as X-Noroff-API-Key on every request
    pub api_key: String,
    // None leaves the platform default in place
    pub timeout: Option<Duration>,
    pub session_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout: None,
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // Builds a config from any variable source, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup(BASE_URL_VAR).unwrap_or_else(|| {
            info!("{BASE_URL_VAR} not set, using default: {}", defaults.base_url);
            defaults.base_url.clone()
        });

        let api_key = lookup(API_KEY_VAR).ok_or_else(|| {
            warn!("{API_KEY_VAR} not set");
            ClientError::ConfigError(format!("{API_KEY_VAR} must be set"))
        })?;

        let timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => {
                let millis = raw.trim().parse::<u64>().map_err(|e| {
                    warn!("Invalid {TIMEOUT_VAR} value: {e}");
                    ClientError::ConfigError(format!("{TIMEOUT_VAR} is not a number: {raw}"))
                })?;
                Some(Duration::from_millis(millis))
            }
            None => None,
        };

        let session_path = lookup(SESSION_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                info!(
                    "{SESSION_PATH_VAR} not set, using default: {}",
                    defaults.session_path.display()
                );
                defaults.session_path.clone()
            });

        let config = Self {
            base_url,
            api_key,
            timeout,
            session_path,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.api_key.trim().is_empty() {
            return Err(ClientError::ConfigError("API key is empty".to_string()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::ConfigError(format!(
                "Base URL must start with http:// or https://: {}",
                self.base_url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied_when_only_key_set() {
        let config = ClientConfig::from_lookup(lookup_from(&[(API_KEY_VAR, "abc-123")])).unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_key, "abc-123");
        assert_eq!(config.timeout, None);
        assert_eq!(config.session_path, PathBuf::from(DEFAULT_SESSION_PATH));
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let result = ClientConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ClientError::ConfigError(_))));
    }

    #[test]
    fn test_overrides_are_read() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (API_KEY_VAR, "key"),
            (BASE_URL_VAR, "http://localhost:8080"),
            (TIMEOUT_VAR, "2500"),
            (SESSION_PATH_VAR, "/tmp/holidaze.json"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.session_path, PathBuf::from("/tmp/holidaze.json"));
    }

    #[test]
    fn test_invalid_timeout_and_url() {
        let bad_timeout =
            ClientConfig::from_lookup(lookup_from(&[(API_KEY_VAR, "key"), (TIMEOUT_VAR, "soon")]));
        assert!(matches!(bad_timeout, Err(ClientError::ConfigError(_))));

        let bad_url = ClientConfig::from_lookup(lookup_from(&[
            (API_KEY_VAR, "key"),
            (BASE_URL_VAR, "v2.api.noroff.dev"),
        ]));
        assert!(matches!(bad_url, Err(ClientError::ConfigError(_))));
    }
}
