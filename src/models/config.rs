// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::SelectorConfig;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// File locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Extraction strategies and caps
    #[serde(default)]
    pub extraction: SelectorConfig,

    /// Forwarding settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Continuous mode settings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Log settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Overlay notifier credentials taken from the process environment.
    ///
    /// Only the entry point calls this; core components get the resulting
    /// value and never read the environment themselves.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.notify.bot_token = token;
        }
        if let Some(chat_id) = lookup("TELEGRAM_CHAT_ID").filter(|v| !v.trim().is_empty()) {
            self.notify.chat_id = chat_id;
        }
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let paths = [
            ("paths.store_file", &self.paths.store_file),
            ("paths.sent_file", &self.paths.sent_file),
            ("paths.snapshot_dir", &self.paths.snapshot_dir),
        ];
        for (name, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(AppError::validation(format!("{name} is empty")));
            }
        }

        let extraction = &self.extraction;
        if extraction.max_posts == 0 {
            return Err(AppError::validation("extraction.max_posts must be > 0"));
        }
        if self.schedule.interval_secs == 0 {
            return Err(AppError::validation("schedule.interval_secs must be > 0"));
        }
        if extraction.container_selectors.is_empty() {
            return Err(AppError::validation("No container selectors defined"));
        }
        if extraction.link_selectors.is_empty() {
            return Err(AppError::validation("No link selectors defined"));
        }
        if extraction.id_patterns.is_empty() {
            return Err(AppError::validation("No id patterns defined"));
        }

        let selectors = extraction
            .container_selectors
            .iter()
            .chain(std::iter::once(&extraction.fallback_selector))
            .chain(&extraction.link_selectors)
            .chain(&extraction.caption_selectors)
            .chain(&extraction.timestamp_selectors)
            .chain(std::iter::once(&extraction.share_selector))
            .chain(std::iter::once(&self.notify.caption_selector));
        for selector in selectors {
            Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }

        for pattern in &extraction.id_patterns {
            let regex = Regex::new(pattern)?;
            if regex.captures_len() < 2 {
                return Err(AppError::validation(format!(
                    "id pattern '{pattern}' has no capture group"
                )));
            }
        }
        Regex::new(&extraction.group_link_pattern)?;

        Ok(())
    }
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Post record store (CSV)
    #[serde(default = "defaults::store_file")]
    pub store_file: PathBuf,

    /// Sent-links log, one canonical URL per line
    #[serde(default = "defaults::sent_file")]
    pub sent_file: PathBuf,

    /// Saved page markup awaiting processing
    #[serde(default = "defaults::snapshot_dir")]
    pub snapshot_dir: PathBuf,

    /// Discovered group URLs
    #[serde(default = "defaults::group_urls_file")]
    pub group_urls_file: PathBuf,

    /// Statistics of the last cycle (JSON)
    #[serde(default = "defaults::stats_file")]
    pub stats_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            store_file: defaults::store_file(),
            sent_file: defaults::sent_file(),
            snapshot_dir: defaults::snapshot_dir(),
            group_urls_file: defaults::group_urls_file(),
            stats_file: defaults::stats_file(),
        }
    }
}

/// Forwarding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Bot API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Bot token (usually taken from the environment)
    #[serde(default)]
    pub bot_token: String,

    /// Destination chat
    #[serde(default)]
    pub chat_id: String,

    /// Prefix for relative post paths found in saved markup
    #[serde(default = "defaults::site_base")]
    pub site_base: String,

    /// Caption elements collected by the sanitizer
    #[serde(default = "defaults::caption_selector")]
    pub caption_selector: String,

    /// Forward only captions containing one of these (empty = all)
    #[serde(default)]
    pub allow_keywords: Vec<String>,

    /// Never forward captions containing one of these
    #[serde(default)]
    pub deny_keywords: Vec<String>,

    /// Also forward records from the post store
    #[serde(default)]
    pub from_store: bool,

    /// Delete processed snapshots after forwarding
    #[serde(default = "defaults::sweep_snapshots")]
    pub sweep_snapshots: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            bot_token: String::new(),
            chat_id: String::new(),
            site_base: defaults::site_base(),
            caption_selector: defaults::caption_selector(),
            allow_keywords: Vec::new(),
            deny_keywords: Vec::new(),
            from_store: false,
            sweep_snapshots: defaults::sweep_snapshots(),
        }
    }
}

/// Continuous mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Sleep between two cycles, in seconds
    #[serde(default = "defaults::interval_secs")]
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval_secs(),
        }
    }
}

/// Log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "defaults::level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Path defaults
    pub fn store_file() -> PathBuf {
        PathBuf::from("output/posts.csv")
    }
    pub fn sent_file() -> PathBuf {
        PathBuf::from("output/sent_posts.txt")
    }
    pub fn snapshot_dir() -> PathBuf {
        PathBuf::from("logs")
    }
    pub fn group_urls_file() -> PathBuf {
        PathBuf::from("output/group_urls.txt")
    }
    pub fn stats_file() -> PathBuf {
        PathBuf::from("output/last_cycle.json")
    }

    // Notify defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn site_base() -> String {
        "https://www.facebook.com".into()
    }
    pub fn caption_selector() -> String {
        "[data-ad-rendering-role='story_message']".into()
    }
    pub fn sweep_snapshots() -> bool {
        true
    }

    // Schedule defaults
    pub fn interval_secs() -> u64 {
        900
    }

    // Logging defaults
    pub fn level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_cap() {
        let mut config = Config::default();
        config.extraction.max_posts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = Config::default();
        config.extraction.link_selectors.push("[[invalid".into());
        assert!(matches!(
            config.validate(),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn validate_rejects_pattern_without_capture() {
        let mut config = Config::default();
        config.extraction.id_patterns = vec![r"/posts/\d+".into()];
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn apply_env_overrides_credentials() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            "TELEGRAM_BOT_TOKEN" => Some("token".into()),
            "TELEGRAM_CHAT_ID" => Some("  ".into()),
            _ => None,
        });
        assert_eq!(config.notify.bot_token, "token");
        assert!(config.notify.chat_id.is_empty());
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let rendered = Config::default().to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.extraction.link_selectors.len(), 5);
        assert_eq!(parsed.schedule.interval_secs, 900);
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let config = Config::load_or_default("definitely/not/here.toml");
        assert_eq!(config.paths.store_file, PathBuf::from("output/posts.csv"));
    }
}
