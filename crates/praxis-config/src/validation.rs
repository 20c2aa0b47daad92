// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! This module checks that configuration values are within the ranges the
//! control loop can operate with. Every violation is collected so a single
//! report lists all of them.

use crate::{ConfigError, ConfigResult, PraxisConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    OutOfRange {
        field: String,
        value: String,
        expected: String,
    },
    InvalidUsername {
        field: String,
        value: String,
    },
    MissingRequired {
        field: String,
    },
}

impl ConfigValidationError {
    /// Dotted path of the offending field
    pub fn field(&self) -> &str {
        match self {
            Self::OutOfRange { field, .. }
            | Self::InvalidUsername { field, .. }
            | Self::MissingRequired { field } => field,
        }
    }
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                value,
                expected,
            } => {
                write!(f, "{} = {} is outside valid range ({})", field, value, expected)
            }
            Self::InvalidUsername { field, value } => {
                write!(
                    f,
                    "{} = '{}' must be 3-16 characters of letters, digits or underscore",
                    field, value
                )
            }
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationFailed` carrying every violation found
pub fn validate_config(config: &PraxisConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_runtime(config, &mut errors);
    validate_supervisor(config, &mut errors);
    validate_humanization(config, &mut errors);
    validate_behavior(config, &mut errors);

    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed(errors));
    }

    Ok(())
}

/// Whether `name` is 3-16 characters of `[A-Za-z0-9_]`
pub fn is_valid_username(name: &str) -> bool {
    let len = name.chars().count();
    (3..=16).contains(&len) && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_range<T>(field: &str, value: T, min: T, max: T, errors: &mut Vec<ConfigValidationError>)
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        errors.push(ConfigValidationError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            expected: format!("{}-{}", min, max),
        });
    }
}

fn check_positive(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if value.is_nan() || value <= 0.0 {
        errors.push(ConfigValidationError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            expected: "> 0".to_string(),
        });
    }
}

fn validate_runtime(config: &PraxisConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.scheduler.workers < 1 {
        errors.push(ConfigValidationError::OutOfRange {
            field: "scheduler.workers".to_string(),
            value: config.scheduler.workers.to_string(),
            expected: ">= 1".to_string(),
        });
    }
    check_positive("cache.ttl_ms", config.cache.ttl_ms as f64, errors);
}

fn validate_supervisor(config: &PraxisConfig, errors: &mut Vec<ConfigValidationError>) {
    let s = &config.supervisor;
    check_range("supervisor.action_delay_ms", s.action_delay_ms, 10, 5000, errors);
    check_positive("supervisor.capture_timeout_ms", s.capture_timeout_ms as f64, errors);
    check_positive("supervisor.fps_threshold", s.fps_threshold, errors);
    if s.max_consecutive_errors < 1 {
        errors.push(ConfigValidationError::OutOfRange {
            field: "supervisor.max_consecutive_errors".to_string(),
            value: s.max_consecutive_errors.to_string(),
            expected: ">= 1".to_string(),
        });
    }
}

fn validate_humanization(config: &PraxisConfig, errors: &mut Vec<ConfigValidationError>) {
    let h = &config.humanization;
    if h.mouse_sensitivity.is_nan() {
        errors.push(ConfigValidationError::OutOfRange {
            field: "humanization.mouse_sensitivity".to_string(),
            value: "NaN".to_string(),
            expected: "0.1-5".to_string(),
        });
    } else {
        check_range("humanization.mouse_sensitivity", h.mouse_sensitivity, 0.1, 5.0, errors);
    }
    check_range("humanization.rotation_speed", h.rotation_speed, 10, 500, errors);
    check_range("humanization.humanization_level", h.humanization_level, 0, 100, errors);
}

fn validate_behavior(config: &PraxisConfig, errors: &mut Vec<ConfigValidationError>) {
    let b = &config.behavior;

    if b.bot_username.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "behavior.bot_username".to_string(),
        });
    } else if !is_valid_username(&b.bot_username) {
        errors.push(ConfigValidationError::InvalidUsername {
            field: "behavior.bot_username".to_string(),
            value: b.bot_username.clone(),
        });
    }

    for (index, player) in b.known_players.iter().enumerate() {
        if !is_valid_username(player) {
            errors.push(ConfigValidationError::InvalidUsername {
                field: format!("behavior.known_players[{}]", index),
                value: player.clone(),
            });
        }
    }

    check_range("behavior.detection_radius", b.detection_radius, 1, 50, errors);
    check_positive("behavior.mining_speed", b.mining_speed as f64, errors);
    check_positive("behavior.proximity_radius", b.proximity_radius, errors);
}
