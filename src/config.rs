//! Client configuration.
//!
//! Defaults point at a locally running backend. Values can be deserialized from a
//! host's settings or overridden from the environment.

use crate::constants::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use log::warn;
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`ClientConfig::base_url`].
pub const ENV_API_URL: &str = "FLOWDOC_API_URL";
/// Environment variable overriding [`ClientConfig::timeout_secs`].
pub const ENV_TIMEOUT_SECS: &str = "FLOWDOC_TIMEOUT_SECS";

/// Where the backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend address; `/api/...` paths are appended to it
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `FLOWDOC_API_URL` and `FLOWDOC_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`. Unparseable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|url| !url.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => warn!("Ignoring {ENV_TIMEOUT_SECS}={raw}: not a number of seconds"),
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();

        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::default().with_overrides(|key| match key {
            ENV_API_URL => Some("https://flows.example.com".to_string()),
            ENV_TIMEOUT_SECS => Some("5".to_string()),
            _ => None,
        });

        assert_eq!(config.base_url, "https://flows.example.com");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_bad_timeout_is_ignored() {
        let config = ClientConfig::default().with_overrides(|key| {
            (key == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        });

        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_partial_serde_config() {
        let config: ClientConfig = serde_json::from_str(r#"{"timeout_secs": 2}"#).unwrap();

        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, 2);
    }
}
