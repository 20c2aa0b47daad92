// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `praxis_configuration.toml`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PraxisConfig {
    pub system: SystemConfig,
    pub scheduler: SchedulerConfig,
    pub cache: CacheConfig,
    pub supervisor: SupervisorConfig,
    pub humanization: HumanizationConfig,
    pub behavior: BehaviorConfig,
}

/// System-level configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    pub log_level: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Worker pool sizing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub workers: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

/// Frame cache policy
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entries at or beyond this age are never served as hits
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_ms: 1000 }
    }
}

/// Supervisory loop pacing, deadlines and failure policy
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Base inter-tick delay; doubled while throughput is below `fps_threshold`
    pub action_delay_ms: u64,
    pub capture_timeout_ms: u64,
    pub fps_threshold: f64,
    pub max_consecutive_errors: u32,
    pub backoff_timeout_ms: u64,
    pub backoff_perception_ms: u64,
    pub backoff_unknown_ms: u64,
    pub proximity_hold_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            action_delay_ms: 150,
            capture_timeout_ms: 1000,
            fps_threshold: 30.0,
            max_consecutive_errors: 5,
            backoff_timeout_ms: 1000,
            backoff_perception_ms: 500,
            backoff_unknown_ms: 1000,
            proximity_hold_ms: 1000,
        }
    }
}

/// Humanized timing and motion parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HumanizationConfig {
    pub mouse_sensitivity: f64,
    pub rotation_speed: u32,
    /// 0 = mechanical, 100 = maximum variation
    pub humanization_level: u32,
    pub reaction_time_ms: u64,
    pub reaction_variance_ms: u64,
    pub idle_fatigue_threshold_secs: u64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for HumanizationConfig {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 1.0,
            rotation_speed: 100,
            humanization_level: 80,
            reaction_time_ms: 150,
            reaction_variance_ms: 50,
            idle_fatigue_threshold_secs: 1800,
            seed: None,
        }
    }
}

/// Which block categories the primary task targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningMode {
    #[default]
    Blocks,
    Ores,
    Trees,
    Mixed,
}

impl MiningMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Ores => "ores",
            Self::Trees => "trees",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for MiningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MiningMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blocks" => Ok(Self::Blocks),
            "ores" => Ok(Self::Ores),
            "trees" => Ok(Self::Trees),
            "mixed" => Ok(Self::Mixed),
            other => Err(format!(
                "unknown mining mode '{}', expected blocks, ores, trees or mixed",
                other
            )),
        }
    }
}

/// Decision-phase behaviour
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub bot_username: String,
    pub mining_mode: MiningMode,
    /// Percent; 100 = nominal break time
    pub mining_speed: u32,
    pub detection_radius: u32,
    pub proximity_radius: f64,
    pub mention_window_secs: u64,
    pub auto_switch_tools: bool,
    pub avoid_bedrock: bool,
    pub chat_responses: bool,
    pub pause_on_player: bool,
    pub known_players: Vec<String>,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            bot_username: "MinerBot".to_string(),
            mining_mode: MiningMode::Blocks,
            mining_speed: 150,
            detection_radius: 16,
            proximity_radius: 3.0,
            mention_window_secs: 30,
            auto_switch_tools: true,
            avoid_bedrock: true,
            chat_responses: true,
            pause_on_player: true,
            known_players: Vec::new(),
        }
    }
}
