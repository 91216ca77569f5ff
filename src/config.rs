//! Configuration for the chat client and the mock Session API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ChatError, ChatResult};

/// Environment variable holding the Session API base URL.
pub const API_URL_ENV: &str = "REGASSIST_API_URL";
/// Environment variable holding the request timeout in seconds. Unset or `0`
/// waits forever.
pub const TIMEOUT_ENV: &str = "REGASSIST_TIMEOUT_SECS";
/// Environment variable holding the connect timeout in seconds.
pub const CONNECT_TIMEOUT_ENV: &str = "REGASSIST_CONNECT_TIMEOUT_SECS";
/// Presence of this variable disables ANSI styling.
pub const NO_COLOR_ENV: &str = "NO_COLOR";
/// Environment variable holding the mock server port.
pub const MOCK_PORT_ENV: &str = "REGASSIST_MOCK_PORT";
/// Environment variable controlling whether the mock server is seeded.
pub const MOCK_SEED_ENV: &str = "REGASSIST_MOCK_SEED";

/// Default Session API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
/// Default mock server port.
pub const DEFAULT_MOCK_PORT: u16 = 5000;

/// Configuration of the interactive client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the Session API; routes are appended below it.
    pub api_url: Url,
    /// Whole-request timeout. `None` waits forever.
    #[serde(with = "optional_secs")]
    pub request_timeout: Option<Duration>,
    /// Connection establishment timeout.
    #[serde(with = "optional_secs")]
    pub connect_timeout: Option<Duration>,
    /// Whether to emit ANSI styling.
    pub color: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout: None,
            connect_timeout: Some(Duration::from_secs(10)),
            color: true,
        }
    }
}

impl ClientConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the process environment.
    ///
    /// # Errors
    /// Returns an error if a variable is set but unparsable.
    pub fn from_env() -> ChatResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup, falling back to defaults.
    ///
    /// # Errors
    /// Returns an error if a value is present but unparsable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ChatResult<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(API_URL_ENV) {
            config = config.with_api_url(&raw)?;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            config.request_timeout = parse_secs(TIMEOUT_ENV, &raw)?;
        }
        if let Some(raw) = lookup(CONNECT_TIMEOUT_ENV) {
            config.connect_timeout = parse_secs(CONNECT_TIMEOUT_ENV, &raw)?;
        }
        if lookup(NO_COLOR_ENV).is_some_and(|v| !v.is_empty()) {
            config.color = false;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the API base URL.
    ///
    /// # Errors
    /// Returns an error if the URL does not parse.
    pub fn with_api_url(mut self, raw: &str) -> ChatResult<Self> {
        self.api_url = Url::parse(raw)?;
        Ok(self)
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enable or disable styling.
    #[must_use]
    pub const fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the URL cannot serve as a base for API routes.
    pub fn validate(&self) -> ChatResult<()> {
        if self.api_url.cannot_be_a_base() {
            return Err(ChatError::Config(format!(
                "{API_URL_ENV} must be a hierarchical URL, got {}",
                self.api_url
            )));
        }
        if !matches!(self.api_url.scheme(), "http" | "https") {
            return Err(ChatError::Config(format!(
                "{API_URL_ENV} must use http or https, got {}",
                self.api_url.scheme()
            )));
        }
        Ok(())
    }
}

/// Configuration of the mock Session API server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Seed the sample conversations on startup.
    pub seed: bool,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_MOCK_PORT,
            seed: true,
        }
    }
}

impl MockServerConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    /// Returns an error if a variable is set but unparsable.
    pub fn from_env() -> ChatResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup, falling back to defaults.
    ///
    /// # Errors
    /// Returns an error if a value is present but unparsable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ChatResult<Self> {
        let mut config = Self::default();
        if let Some(raw) = lookup(MOCK_PORT_ENV) {
            config.port = raw
                .trim()
                .parse()
                .map_err(|_| ChatError::Config(format!("{MOCK_PORT_ENV}: invalid port {raw:?}")))?;
        }
        if let Some(raw) = lookup(MOCK_SEED_ENV) {
            config.seed = parse_bool(MOCK_SEED_ENV, &raw)?;
        }
        Ok(config)
    }
}

fn default_api_url() -> Url {
    match Url::parse(DEFAULT_API_URL) {
        Ok(url) => url,
        Err(_) => unreachable!("DEFAULT_API_URL is a valid URL"),
    }
}

fn parse_secs(key: &str, raw: &str) -> ChatResult<Option<Duration>> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| ChatError::Config(format!("{key}: expected whole seconds, got {raw:?}")))?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

fn parse_bool(key: &str, raw: &str) -> ChatResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ChatError::Config(format!("{key}: expected a boolean, got {raw:?}"))),
    }
}

/// Serde module for optional whole-second durations (`0` means none).
mod optional_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.map_or(0, |d| d.as_secs()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok((secs > 0).then(|| Duration::from_secs(secs)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url.as_str(), "http://localhost:5000/api");
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(10)));
        assert!(config.color);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_URL_ENV, "https://regs.example.org/v1/api"),
            (TIMEOUT_ENV, "90"),
            (NO_COLOR_ENV, "1"),
        ]));
        let config = config.unwrap_or_default();
        assert_eq!(config.api_url.as_str(), "https://regs.example.org/v1/api");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(90)));
        assert!(!config.color);
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "soon")]));
        assert!(matches!(err, Err(ChatError::Config(_))));
    }

    #[test]
    fn test_non_http_url_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(API_URL_ENV, "ftp://example.org/api")]));
        assert!(matches!(err, Err(ChatError::Config(_))));
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new()
            .with_timeout(Some(Duration::from_secs(5)))
            .with_color(false);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
        assert!(!config.color);
    }

    #[test]
    fn test_config_serde_uses_seconds() {
        let config = ClientConfig::default().with_timeout(None);
        let json = serde_json::to_value(&config).unwrap_or_default();
        assert_eq!(json["request_timeout"], 0);
        assert_eq!(json["connect_timeout"], 10);
    }

    #[test]
    fn test_mock_config() {
        let config = MockServerConfig::from_lookup(lookup(&[
            (MOCK_PORT_ENV, "8081"),
            (MOCK_SEED_ENV, "false"),
        ]))
        .unwrap_or_default();
        assert_eq!(config.port, 8081);
        assert!(!config.seed);

        let err = MockServerConfig::from_lookup(lookup(&[(MOCK_SEED_ENV, "maybe")]));
        assert!(err.is_err());
    }
}
