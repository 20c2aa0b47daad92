// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Praxis Configuration System
//!
//! Type-safe configuration loader for the Praxis control loop with support for:
//! - TOML file parsing
//! - Environment variable overrides
//! - CLI argument overrides
//! - Range validation that reports every violation at once
//!
//! ## Usage
//!
//! ```rust,no_run
//! use praxis_config::{load_config, validate_config};
//!
//! let config = load_config(None, None).expect("Failed to load config");
//! validate_config(&config).expect("Invalid config");
//!
//! println!("Workers: {}", config.scheduler.workers);
//! println!("Base delay: {} ms", config.supervisor.action_delay_ms);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{apply_cli_overrides, apply_environment_overrides, find_config_file, load_config};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Configuration validation failed:\n{}", format_violations(.0))]
    ValidationFailed(Vec<ConfigValidationError>),
}

impl ConfigError {
    /// Individual rule violations, empty for non-validation errors
    pub fn violations(&self) -> &[ConfigValidationError] {
        match self {
            ConfigError::ValidationFailed(errors) => errors,
            _ => &[],
        }
    }
}

fn format_violations(errors: &[ConfigValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_every_violation() {
        let err = ConfigError::ValidationFailed(vec![
            ConfigValidationError::OutOfRange {
                field: "scheduler.workers".to_string(),
                value: "0".to_string(),
                expected: ">= 1".to_string(),
            },
            ConfigValidationError::InvalidUsername {
                field: "behavior.bot_username".to_string(),
                value: "x".to_string(),
            },
        ]);

        let msg = err.to_string();
        assert!(msg.contains("scheduler.workers"));
        assert!(msg.contains("behavior.bot_username"));
        assert_eq!(err.violations().len(), 2);
    }
}
