//! Configuration file parser for ~/.config/postfeed/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted but logged, since they are usually typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::{FeedSettings, DEFAULT_FEED_URL, DEFAULT_PROXY_URL, EXCERPT_WORDS};
use crate::resource::{CachePolicy, DEFAULT_CAPACITY};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds the maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Syndication feed handed to the proxy.
    pub feed_url: String,

    /// RSS-to-JSON proxy endpoint.
    pub proxy_url: String,

    /// Minutes a fetched feed is served from cache before refetching.
    pub stale_minutes: u64,

    /// Automatic retries after a failed fetch.
    pub retry_count: u32,

    /// Delay before the first retry, in milliseconds.
    pub retry_delay_ms: u64,

    /// Word budget for post excerpts.
    pub excerpt_words: usize,

    /// Transport timeout for one proxy request. 0 = no timeout.
    pub request_timeout_secs: u64,

    /// Maximum number of cached feeds.
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            stale_minutes: 15,
            retry_count: 1,
            retry_delay_ms: 1000,
            excerpt_words: EXCERPT_WORDS,
            request_timeout_secs: 30,
            cache_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "feed_url",
        "proxy_url",
        "stale_minutes",
        "retry_count",
        "retry_delay_ms",
        "excerpt_words",
        "request_timeout_secs",
        "cache_capacity",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), feed = %config.feed_url, "Loaded configuration");
        Ok(config)
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            feed_url: self.feed_url.clone(),
            proxy_url: self.proxy_url.clone(),
            excerpt_words: self.excerpt_words,
        }
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            stale_time: Duration::from_secs(self.stale_minutes.saturating_mul(60)),
            retry: self.retry_count,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.feed_url, DEFAULT_FEED_URL);
        assert_eq!(config.proxy_url, DEFAULT_PROXY_URL);
        assert_eq!(config.excerpt_words, 40);
        assert_eq!(config.cache_policy(), CachePolicy::default());
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/postfeed_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.stale_minutes, 15);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let dir = std::env::temp_dir().join("postfeed_config_test_whitespace");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "   \n  \n  ").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.retry_count, 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = std::env::temp_dir().join("postfeed_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "feed_url = \"https://blog.example.com/rss\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.feed_url, "https://blog.example.com/rss");
        assert_eq!(config.proxy_url, DEFAULT_PROXY_URL);
        assert_eq!(config.stale_minutes, 15);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = std::env::temp_dir().join("postfeed_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
feed_url = "https://blog.example.com/rss"
proxy_url = "https://proxy.example.com/v1/api.json"
stale_minutes = 5
retry_count = 3
retry_delay_ms = 250
excerpt_words = 20
request_timeout_secs = 0
cache_capacity = 2
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        let policy = config.cache_policy();
        assert_eq!(policy.stale_time, Duration::from_secs(300));
        assert_eq!(policy.retry, 3);
        assert_eq!(policy.retry_delay, Duration::from_millis(250));
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.cache_capacity, 2);

        let settings = config.feed_settings();
        assert_eq!(settings.proxy_url, "https://proxy.example.com/v1/api.json");
        assert_eq!(settings.excerpt_words, 20);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("postfeed_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = std::env::temp_dir().join("postfeed_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "stale_minutes = 1\nstale_minuets = 2\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.stale_minutes, 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let dir = std::env::temp_dir().join("postfeed_config_test_wrongtype");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "stale_minutes = \"fifteen\"\n").unwrap();

        assert!(Config::load(&path).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("postfeed_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
