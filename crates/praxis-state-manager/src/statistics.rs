// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Copy-out statistics snapshot

use crate::loop_state::LoopPhase;
use serde::{Deserialize, Serialize};

/// Point-in-time view of the loop, safe to hand to any reader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopStatistics {
    pub blocks_mined: u64,
    pub runtime_secs: u64,
    pub players_detected: u32,
    /// Blocks per minute of runtime
    pub efficiency: f64,
    pub ticks: u64,
    pub failed_ticks: u64,
    pub consecutive_errors: u32,
    pub last_error: Option<String>,
    pub fps: f64,
    pub avg_tick_ms: f64,
    pub phase: LoopPhase,
    pub paused: bool,
    pub circuit_open: bool,
}

impl LoopStatistics {
    pub fn blocks_per_minute(blocks: u64, runtime_secs: u64) -> f64 {
        if runtime_secs == 0 {
            0.0
        } else {
            blocks as f64 * 60.0 / runtime_secs as f64
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase != LoopPhase::Stopped
    }
}
