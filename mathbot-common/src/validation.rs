//! Configuration validation.
//!
//! Checks that configured values are within valid ranges before the
//! service starts.

use std::str::FromStr;
use thiserror::Error;

use crate::config::{AssetsConfig, Config, ObservabilityConfig, SessionsConfig, TelegramConfig};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let sections: [&dyn Validate; 4] =
            [&self.telegram, &self.assets, &self.sessions, &self.observability];

        let mut errors: Vec<ValidationError> = sections
            .iter()
            .filter_map(|section| section.validate().err())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }

    /// Load (with env overrides) and validate configuration.
    pub fn load_and_validate(path: Option<&std::path::Path>) -> anyhow::Result<Self> {
        let config = Self::load_with_env(path)?;
        config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(config)
    }
}

impl Validate for TelegramConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(ValidationError::InvalidValue {
                field: "telegram.api_base".into(),
                reason: format!("'{}' is not an http(s) URL", self.api_base),
            });
        }
        let has_token = self.bot_token.as_deref().is_some_and(|t| !t.trim().is_empty());
        if !has_token && self.token_file.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "telegram.bot_token or telegram.token_file".into(),
            });
        }
        Ok(())
    }
}

impl Validate for AssetsConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.images_dir.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "assets.images_dir".into(),
            });
        }
        if self.picker_image.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "assets.picker_image".into(),
            });
        }
        Ok(())
    }
}

impl Validate for SessionsConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.idle_ttl_secs > 0 && self.cleanup_interval_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "sessions.cleanup_interval_secs".into(),
                reason: "must be positive when idle_ttl_secs is set".into(),
            });
        }
        if self.worker_idle_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "sessions.worker_idle_secs".into(),
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        if tracing::Level::from_str(&self.log_level).is_err() {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!(
                    "'{}' is not one of trace, debug, info, warn, error",
                    self.log_level
                ),
            });
        }
        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("'{}' must be json or pretty", self.log_format),
            });
        }
        Ok(())
    }
}
