//! Mathbot Common - Shared types, utilities, and configuration for the math variant bot.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Configuration validation
//! - Error types and handling utilities
//! - Logging setup and trace ID helpers
//! - Small utility functions used by the channel service

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod util;
pub mod validation;

pub use config::{
    AssetsConfig, Config, ObservabilityConfig, SessionsConfig, TelegramConfig,
};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};
