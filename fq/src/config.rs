//! FlashQuest configuration types and loading

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::Cooldowns;

/// Main FlashQuest configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// API connection
    pub api: ApiConfig,

    /// Automatic login
    pub auth: AuthConfig,

    /// Study session timing and gestures
    pub study: StudyConfig,

    /// Notice queue limits
    pub notices: NoticeConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .flashquest.yml
        let local_config = PathBuf::from(".flashquest.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/flashquest/flashquest.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("flashquest").join("flashquest.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed: the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => path.clone(),
            None => {
                let local = PathBuf::from(".flashquest.yml");
                if local.exists() {
                    local
                } else {
                    dirs::config_dir()?.join("flashquest").join("flashquest.yml")
                }
            }
        };
        let content = fs::read_to_string(path).ok()?;
        serde_yaml::from_str::<Self>(&content).ok()?.log_level
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// API connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Environment variable holding a session cookie (`name=value`)
    #[serde(rename = "session-env")]
    pub session_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_ms: 30_000,
            session_env: "FQ_SESSION".to_string(),
        }
    }
}

impl ApiConfig {
    /// Session cookie from the environment, if set
    pub fn session_cookie(&self) -> Option<String> {
        std::env::var(&self.session_env).ok().filter(|s| !s.trim().is_empty())
    }
}

/// Automatic login configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Account email
    pub email: Option<String>,

    /// Environment variable containing the password
    #[serde(rename = "password-env")]
    pub password_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            email: None,
            password_env: "FQ_PASSWORD".to_string(),
        }
    }
}

impl AuthConfig {
    /// Email and password when both are available
    pub fn credentials(&self) -> Option<(String, String)> {
        let email = self.email.clone()?;
        let password = std::env::var(&self.password_env).ok()?;
        Some((email, password))
    }
}

/// Study session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Drag distance that counts as a swipe
    #[serde(rename = "swipe-threshold")]
    pub swipe_threshold: i32,

    /// Drag units per terminal column
    #[serde(rename = "cell-width")]
    pub cell_width: i32,

    /// Delay between an answer and the next card
    #[serde(rename = "exit-delay-ms")]
    pub exit_delay_ms: u64,

    /// Delay before leaving a completed single-deck session
    #[serde(rename = "deck-complete-delay-ms")]
    pub deck_complete_delay_ms: u64,

    /// Delay before leaving a completed cross-deck session
    #[serde(rename = "all-complete-delay-ms")]
    pub all_complete_delay_ms: u64,

    /// How often answered cards are checked for re-admission
    #[serde(rename = "recurrence-interval-ms")]
    pub recurrence_interval_ms: u64,

    #[serde(rename = "cooldown-new-ms")]
    pub cooldown_new_ms: u64,

    #[serde(rename = "cooldown-learning-ms")]
    pub cooldown_learning_ms: u64,

    #[serde(rename = "cooldown-mastered-ms")]
    pub cooldown_mastered_ms: u64,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: 100,
            cell_width: 8,
            exit_delay_ms: 500,
            deck_complete_delay_ms: 2000,
            all_complete_delay_ms: 1500,
            recurrence_interval_ms: 10_000,
            cooldown_new_ms: 30_000,
            cooldown_learning_ms: 60_000,
            cooldown_mastered_ms: 120_000,
        }
    }
}

impl StudyConfig {
    pub fn cooldowns(&self) -> Cooldowns {
        Cooldowns {
            new: Duration::from_millis(self.cooldown_new_ms),
            learning: Duration::from_millis(self.cooldown_learning_ms),
            mastered: Duration::from_millis(self.cooldown_mastered_ms),
        }
    }
}

/// Notice queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    /// Maximum notices shown at once
    pub capacity: usize,

    /// Default time a notice stays visible
    #[serde(rename = "ttl-ms")]
    pub ttl_ms: u64,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            capacity: 3,
            ttl_ms: 4500,
        }
    }
}
