use crate::error::ConfigError;
use crate::ui::countdown::MAX_COUNTDOWN_STEPS;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_TWITTER_BEARER_TOKEN: &str = "TWITTER_BEARER_TOKEN";
pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_USER_TO_MONITOR: &str = "USER_TO_MONITOR";

const DEFAULT_TWITTER_API_BASE: &str = "https://api.twitter.com";
const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// The tweets endpoint rejects `max_results` outside this range.
const MIN_MAX_RESULTS: u32 = 5;
const MAX_MAX_RESULTS: u32 = 100;

#[derive(Clone)]
pub struct Config {
    pub twitter: TwitterConfig,
    pub telegram: TelegramConfig,
    pub monitor: MonitorConfig,
}

#[derive(Clone)]
pub struct TwitterConfig {
    pub bearer_token: String,
    pub api_base: String,
    pub max_results: u32,
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub handle: String,
    pub poll_interval: Duration,
    pub rate_limit_cooldown: Duration,
    pub countdown_steps: u64,
    pub show_progress: bool,
    pub request_timeout: Duration,
}

/// On-disk tunables. Credentials never live here.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub twitter: TwitterSection,
    pub telegram: TelegramSection,
    pub monitor: MonitorSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TwitterSection {
    pub api_base: String,
    pub max_results: u32,
}

impl Default for TwitterSection {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_TWITTER_API_BASE.to_string(),
            max_results: MIN_MAX_RESULTS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    pub api_base: String,
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    pub poll_interval_secs: u64,
    pub rate_limit_cooldown_secs: u64,
    pub countdown_steps: u64,
    pub show_progress: bool,
    pub request_timeout_secs: u64,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: 120,
            rate_limit_cooldown_secs: 900,
            countdown_steps: 100,
            show_progress: true,
            request_timeout_secs: 30,
        }
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load an explicit path, or the default location if a file exists there.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tweetrelay").join("config.toml"))
}

impl Config {
    /// Merge file tunables with credentials from the process environment.
    pub fn from_env(file: FileConfig) -> Result<Self, ConfigError> {
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    pub fn from_sources<F>(file: FileConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingVar(key))
        };

        let bearer_token = required(ENV_TWITTER_BEARER_TOKEN)?;
        let bot_token = required(ENV_TELEGRAM_BOT_TOKEN)?;
        let chat_id = required(ENV_TELEGRAM_CHAT_ID)?;
        let handle = required(ENV_USER_TO_MONITOR)?
            .trim_start_matches('@')
            .to_string();

        let monitor = file.monitor;

        Ok(Self {
            twitter: TwitterConfig {
                bearer_token,
                api_base: file.twitter.api_base.trim_end_matches('/').to_string(),
                max_results: file.twitter.max_results.clamp(MIN_MAX_RESULTS, MAX_MAX_RESULTS),
            },
            telegram: TelegramConfig {
                bot_token,
                chat_id,
                api_base: file.telegram.api_base.trim_end_matches('/').to_string(),
            },
            monitor: MonitorConfig {
                handle,
                poll_interval: Duration::from_secs(monitor.poll_interval_secs.max(1)),
                rate_limit_cooldown: Duration::from_secs(monitor.rate_limit_cooldown_secs.max(1)),
                countdown_steps: monitor.countdown_steps.min(MAX_COUNTDOWN_STEPS),
                show_progress: monitor.show_progress,
                request_timeout: Duration::from_secs(monitor.request_timeout_secs.max(1)),
            },
        })
    }
}

impl fmt::Debug for TwitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterConfig")
            .field("bearer_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("max_results", &self.max_results)
            .finish()
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("twitter", &self.twitter)
            .field("telegram", &self.telegram)
            .field("monitor", &self.monitor)
            .finish()
    }
}
