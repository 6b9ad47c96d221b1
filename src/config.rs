use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ChatError;
use crate::session::SESSION_STORAGE_KEY;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5678";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
/// Delay between a completed send and the extra history fetch that follows it.
pub const SEND_REFRESH_DELAY: Duration = Duration::from_millis(500);
/// Upper bound on a single webhook request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime settings of the terminal client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub poll_interval: Duration,
    pub session_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            session_file: PathBuf::from(format!(".{SESSION_STORAGE_KEY}")),
        }
    }
}

impl Config {
    /// Reads the settings from the process environment.
    pub fn from_env() -> Result<Self, ChatError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ChatError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("CHAT_API_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.base_url);

        let poll_interval = match lookup("CHAT_POLL_INTERVAL_MS") {
            Some(raw) => {
                let millis: u64 = raw.trim().parse().map_err(|e| ChatError::InvalidConfig {
                    name: "CHAT_POLL_INTERVAL_MS".to_string(),
                    message: format!("{raw:?} is not a number of milliseconds ({e})"),
                })?;
                if millis == 0 {
                    return Err(ChatError::InvalidConfig {
                        name: "CHAT_POLL_INTERVAL_MS".to_string(),
                        message: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_millis(millis)
            }
            None => defaults.poll_interval,
        };

        let session_file = lookup("CHAT_SESSION_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.session_file);

        Ok(Self { base_url, poll_interval, session_file })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("CHAT_API_BASE_URL", "https://n8n.example.com/"),
            ("CHAT_POLL_INTERVAL_MS", "750"),
            ("CHAT_SESSION_FILE", "/tmp/session"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://n8n.example.com");
        assert_eq!(config.poll_interval, Duration::from_millis(750));
        assert_eq!(config.session_file, PathBuf::from("/tmp/session"));
    }

    #[test]
    fn empty_base_url_uses_default() {
        let config = Config::from_lookup(lookup(&[("CHAT_API_BASE_URL", "  ")])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn bad_interval_is_rejected() {
        let err = Config::from_lookup(lookup(&[("CHAT_POLL_INTERVAL_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ChatError::InvalidConfig { .. }));
        assert!(Config::from_lookup(lookup(&[("CHAT_POLL_INTERVAL_MS", "0")])).is_err());
    }
}
