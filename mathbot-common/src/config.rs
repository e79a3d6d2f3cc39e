//! Configuration management for the math variant bot.
//!
//! The bot reads a single configuration file at `~/.mathbot/config.json`
//! (or the path passed with `--config`).
//!
//! # Configuration Priority
//!
//! 1. Environment variables (MATHBOT_* prefix, `TELEGRAM_BOT_TOKEN`)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `MATHBOT_LOG_LEVEL` → observability.log_level
//! - `MATHBOT_LOG_FORMAT` → observability.log_format
//! - `TELEGRAM_BOT_TOKEN` → telegram.bot_token
//! - `MATHBOT_TOKEN_FILE` → telegram.token_file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".mathbot"),
        |dirs| dirs.home_dir().join(".mathbot"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// JSON Schema reference
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Telegram transport configuration
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Image asset locations
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Session lifetime and worker settings
    #[serde(default)]
    pub sessions: SessionsConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration (default path or `path`) with environment variable overrides.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("MATHBOT_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("MATHBOT_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            if !token.trim().is_empty() {
                self.telegram.bot_token = Some(token);
            }
        }
        if let Ok(file) = std::env::var("MATHBOT_TOKEN_FILE") {
            self.telegram.token_file = file;
        }
    }
}

// ============================================================================
// Telegram
// ============================================================================

/// Telegram channel configuration.
///
/// The bot token is taken from `bot_token` when set, otherwise from the first
/// line of `token_file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
    #[serde(default = "default_token_file")]
    pub token_file: String,
    /// Usernames or numeric ids allowed to talk to the bot ("*" for everyone)
    #[serde(default = "default_allowed_users")]
    pub allowed_users: Vec<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            bot_token: None,
            token_file: default_token_file(),
            allowed_users: default_allowed_users(),
            api_base: default_api_base(),
        }
    }
}

impl TelegramConfig {
    /// Resolve the bot token from the config value or the token file.
    pub fn resolve_bot_token(&self) -> crate::Result<String> {
        if let Some(token) = self.bot_token.as_deref().map(str::trim) {
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }

        let path = PathBuf::from(shellexpand::tilde(&self.token_file).into_owned());
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::Credential(format!(
                    "No token file found at {}. Create one and put your Telegram bot token inside.",
                    path.display()
                )));
            }
            Err(e) => {
                return Err(Error::from(e).with_context(format!("reading {}", path.display())));
            }
        };

        let token = content.lines().next().unwrap_or("").trim();
        if token.is_empty() {
            return Err(Error::Credential(format!(
                "Token file {} is empty. Please put your Telegram bot token inside.",
                path.display()
            )));
        }

        Ok(token.to_string())
    }
}

fn default_token_file() -> String {
    "data/token".into()
}

fn default_allowed_users() -> Vec<String> {
    vec!["*".into()]
}

fn default_api_base() -> String {
    "https://api.telegram.org".into()
}

// ============================================================================
// Assets
// ============================================================================

/// Location of the images sent alongside prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory holding `variants.png` and `<n>.png` per variant
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
    /// File name of the variant picker illustration
    #[serde(default = "default_picker_image")]
    pub picker_image: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            picker_image: default_picker_image(),
        }
    }
}

impl AssetsConfig {
    /// Path of the variant picker illustration.
    pub fn picker_image_path(&self) -> String {
        format!("{}/{}", self.images_dir.trim_end_matches('/'), self.picker_image)
    }

    /// Path of the illustration for a variant number.
    pub fn variant_image_path(&self, variant: u8) -> String {
        format!("{}/{variant}.png", self.images_dir.trim_end_matches('/'))
    }
}

fn default_images_dir() -> String {
    "assets/images".into()
}

fn default_picker_image() -> String {
    "variants.png".into()
}

// ============================================================================
// Sessions
// ============================================================================

/// Session lifetime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Drop sessions idle for longer than this many seconds (0 disables eviction)
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
    /// How often the eviction sweep runs
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    /// Per-user worker task exits after this many idle seconds
    #[serde(default = "default_worker_idle_secs")]
    pub worker_idle_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            worker_idle_secs: default_worker_idle_secs(),
        }
    }
}

fn default_idle_ttl_secs() -> u64 {
    86_400
}

fn default_cleanup_interval_secs() -> u64 {
    600
}

fn default_worker_idle_secs() -> u64 {
    300
}

// ============================================================================
// Observability
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    /// Aliases: "level"
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    /// Aliases: "format"
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

fn default_true() -> bool {
    true
}
