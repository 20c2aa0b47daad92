// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Action categories, delay table and fatigue state.

use praxis_config::HumanizationConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

pub const FATIGUE_FLOOR: f64 = 1.0;
pub const FATIGUE_CEILING: f64 = 1.5;
const FATIGUE_STEP_UP: f64 = 0.1;
const FATIGUE_STEP_DOWN: f64 = 0.05;

const MOVEMENT_BASE_MS: f64 = 50.0;
const TOOL_SWITCH_BASE_MS: f64 = 300.0;
const PLAYER_INTERACTION_BASE_MS: f64 = 500.0;
const MINING_REFERENCE_MS: f64 = 100.0;

/// Closed set of action categories with their own base delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Mining,
    Movement,
    ToolSwitch,
    PlayerInteraction,
    Chat,
    Generic,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Mining,
        ActionKind::Movement,
        ActionKind::ToolSwitch,
        ActionKind::PlayerInteraction,
        ActionKind::Chat,
        ActionKind::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Mining => "mining",
            ActionKind::Movement => "movement",
            ActionKind::ToolSwitch => "tool_switch",
            ActionKind::PlayerInteraction => "player_interaction",
            ActionKind::Chat => "chat",
            ActionKind::Generic => "generic",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generator parameters, usually taken from `[humanization]`
#[derive(Debug, Clone, PartialEq)]
pub struct HumanizationParams {
    pub mouse_sensitivity: f64,
    pub rotation_speed: u32,
    pub humanization_level: u32,
    pub reaction_time_ms: u64,
    pub reaction_variance_ms: u64,
    pub idle_fatigue_threshold: Duration,
    pub seed: Option<u64>,
}

impl HumanizationParams {
    /// 0.0 (mechanical) to 1.0 (maximum variation)
    pub fn human_factor(&self) -> f64 {
        f64::from(self.humanization_level.min(100)) / 100.0
    }

    /// Joint speed and sensitivity scale applied to path perturbations
    pub fn speed_factor(&self) -> f64 {
        (f64::from(self.rotation_speed) / 100.0) * self.mouse_sensitivity
    }

    /// Base delay in milliseconds before fatigue, scaling and variance
    pub fn base_delay_ms(&self, kind: ActionKind) -> f64 {
        match kind {
            ActionKind::Mining => {
                MINING_REFERENCE_MS / (f64::from(self.rotation_speed.max(1)) / 100.0)
            }
            ActionKind::Movement => MOVEMENT_BASE_MS,
            ActionKind::ToolSwitch => TOOL_SWITCH_BASE_MS,
            ActionKind::PlayerInteraction => PLAYER_INTERACTION_BASE_MS,
            ActionKind::Chat | ActionKind::Generic => self.reaction_time_ms as f64,
        }
    }
}

impl From<&HumanizationConfig> for HumanizationParams {
    fn from(config: &HumanizationConfig) -> Self {
        Self {
            mouse_sensitivity: config.mouse_sensitivity,
            rotation_speed: config.rotation_speed,
            humanization_level: config.humanization_level,
            reaction_time_ms: config.reaction_time_ms,
            reaction_variance_ms: config.reaction_variance_ms,
            idle_fatigue_threshold: Duration::from_secs(config.idle_fatigue_threshold_secs),
            seed: config.seed,
        }
    }
}

impl Default for HumanizationParams {
    fn default() -> Self {
        Self::from(&HumanizationConfig::default())
    }
}

/// Fatigue and last-action bookkeeping
///
/// Single writer: only the thread running the action phase may advance it.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingState {
    fatigue_multiplier: f64,
    last_action_at: Instant,
}

impl TimingState {
    pub fn new(origin: Instant) -> Self {
        Self {
            fatigue_multiplier: FATIGUE_FLOOR,
            last_action_at: origin,
        }
    }

    pub fn fatigue_multiplier(&self) -> f64 {
        self.fatigue_multiplier
    }

    pub fn last_action_at(&self) -> Instant {
        self.last_action_at
    }

    /// Step fatigue up after an idle gap longer than `idle_threshold`, down otherwise
    ///
    /// Always records `now` as the last action. Returns the new multiplier,
    /// which stays within [`FATIGUE_FLOOR`, `FATIGUE_CEILING`].
    pub fn advance(&mut self, now: Instant, idle_threshold: Duration) -> f64 {
        let idle = now.saturating_duration_since(self.last_action_at);
        self.fatigue_multiplier = if idle > idle_threshold {
            (self.fatigue_multiplier + FATIGUE_STEP_UP).min(FATIGUE_CEILING)
        } else {
            (self.fatigue_multiplier - FATIGUE_STEP_DOWN).max(FATIGUE_FLOOR)
        };
        self.last_action_at = now;
        self.fatigue_multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THIRTY_MIN: Duration = Duration::from_secs(30 * 60);

    #[test]
    fn test_base_delay_table() {
        let mut params = HumanizationParams::default();
        params.rotation_speed = 200;
        assert_eq!(params.base_delay_ms(ActionKind::Mining), 50.0);
        assert_eq!(params.base_delay_ms(ActionKind::Movement), 50.0);
        assert_eq!(params.base_delay_ms(ActionKind::ToolSwitch), 300.0);
        assert_eq!(params.base_delay_ms(ActionKind::PlayerInteraction), 500.0);
        assert_eq!(params.base_delay_ms(ActionKind::Chat), 150.0);
        assert_eq!(params.base_delay_ms(ActionKind::Generic), 150.0);
    }

    #[test]
    fn test_idle_gap_raises_fatigue_to_ceiling() {
        let origin = Instant::now();
        let mut state = TimingState::new(origin);
        let mut now = origin;
        for _ in 0..10 {
            now += THIRTY_MIN + Duration::from_secs(1);
            let fatigue = state.advance(now, THIRTY_MIN);
            assert!((FATIGUE_FLOOR..=FATIGUE_CEILING).contains(&fatigue));
        }
        assert_eq!(state.fatigue_multiplier(), FATIGUE_CEILING);
        assert_eq!(state.last_action_at(), now);
    }

    #[test]
    fn test_rapid_actions_decay_fatigue() {
        let origin = Instant::now();
        let mut state = TimingState::new(origin);
        let idle = origin + THIRTY_MIN + Duration::from_secs(60);
        let raised = state.advance(idle, THIRTY_MIN);
        assert!(raised > FATIGUE_FLOOR);

        let lowered = state.advance(idle + Duration::from_millis(200), THIRTY_MIN);
        assert!(lowered < raised);

        for step in 1..20u64 {
            state.advance(idle + Duration::from_secs(step), THIRTY_MIN);
        }
        assert_eq!(state.fatigue_multiplier(), FATIGUE_FLOOR);
    }

    #[test]
    fn test_exact_threshold_is_not_idle() {
        let origin = Instant::now();
        let mut state = TimingState::new(origin);
        assert_eq!(state.advance(origin + THIRTY_MIN, THIRTY_MIN), FATIGUE_FLOOR);
    }

    #[test]
    fn test_action_kind_names() {
        let names: Vec<&str> = ActionKind::ALL.iter().map(ActionKind::as_str).collect();
        assert_eq!(
            names,
            vec!["mining", "movement", "tool_switch", "player_interaction", "chat", "generic"]
        );
    }
}
