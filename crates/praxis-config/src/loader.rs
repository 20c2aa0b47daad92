// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, PraxisConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILE_NAME: &str = "praxis_configuration.toml";

/// Find the Praxis configuration file
///
/// Search order:
/// 1. `PRAXIS_CONFIG_PATH` environment variable
/// 2. Current working directory: `./praxis_configuration.toml`
/// 3. Parent directories (up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("PRAXIS_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by PRAXIS_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();

    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Praxis configuration file '{}' not found in any of these locations:\n{}\n\nSet PRAXIS_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// The result is not validated; call [`crate::validate_config`] before use.
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<PraxisConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: PraxisConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parse_into<T: FromStr>(value: &str, slot: &mut T) {
    if let Ok(parsed) = value.trim().parse::<T>() {
        *slot = parsed;
    }
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `PRAXIS_LOG_LEVEL` -> `system.log_level`
/// - `PRAXIS_WORKERS` -> `scheduler.workers`
/// - `PRAXIS_CACHE_TTL_MS` -> `cache.ttl_ms`
/// - `PRAXIS_ACTION_DELAY_MS` -> `supervisor.action_delay_ms`
/// - `PRAXIS_HUMANIZATION_LEVEL` -> `humanization.humanization_level`
/// - `PRAXIS_BOT_USERNAME` -> `behavior.bot_username`
///
/// Values that fail to parse are ignored.
pub fn apply_environment_overrides(config: &mut PraxisConfig) {
    if let Ok(value) = env::var("PRAXIS_LOG_LEVEL") {
        config.system.log_level = value;
    }
    if let Ok(value) = env::var("PRAXIS_WORKERS") {
        parse_into(&value, &mut config.scheduler.workers);
    }
    if let Ok(value) = env::var("PRAXIS_CACHE_TTL_MS") {
        parse_into(&value, &mut config.cache.ttl_ms);
    }
    if let Ok(value) = env::var("PRAXIS_ACTION_DELAY_MS") {
        parse_into(&value, &mut config.supervisor.action_delay_ms);
    }
    if let Ok(value) = env::var("PRAXIS_HUMANIZATION_LEVEL") {
        parse_into(&value, &mut config.humanization.humanization_level);
    }
    if let Ok(value) = env::var("PRAXIS_BOT_USERNAME") {
        config.behavior.bot_username = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"workers": "8", "mining_mode": "ores"}`)
pub fn apply_cli_overrides(config: &mut PraxisConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("log_level") {
        config.system.log_level = value.clone();
    }
    if let Some(value) = cli_args.get("workers") {
        parse_into(value, &mut config.scheduler.workers);
    }
    if let Some(value) = cli_args.get("cache_ttl_ms") {
        parse_into(value, &mut config.cache.ttl_ms);
    }
    if let Some(value) = cli_args.get("action_delay_ms") {
        parse_into(value, &mut config.supervisor.action_delay_ms);
    }
    if let Some(value) = cli_args.get("capture_timeout_ms") {
        parse_into(value, &mut config.supervisor.capture_timeout_ms);
    }
    if let Some(value) = cli_args.get("humanization_level") {
        parse_into(value, &mut config.humanization.humanization_level);
    }
    if let Some(value) = cli_args.get("mouse_sensitivity") {
        parse_into(value, &mut config.humanization.mouse_sensitivity);
    }
    if let Some(value) = cli_args.get("seed") {
        if let Ok(seed) = value.parse::<u64>() {
            config.humanization.seed = Some(seed);
        }
    }
    if let Some(value) = cli_args.get("bot_username") {
        config.behavior.bot_username = value.clone();
    }
    if let Some(value) = cli_args.get("mining_mode") {
        parse_into(value, &mut config.behavior.mining_mode);
    }
    if let Some(value) = cli_args.get("pause_on_player") {
        config.behavior.pause_on_player = value.to_lowercase() == "true" || value == "1";
    }
}
