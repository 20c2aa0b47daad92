// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Loop lifecycle state machine and counters.
//!
//! ```text
//! Stopped ──start──▶ Running ──pause──▶ Paused
//!    ▲                 │  ▲               │
//!    │                 │  └───resume──────┘
//!    └─────stop────────┴──────stop────────┘
//! ```

use crate::events::StopReason;
use crate::statistics::LoopStatistics;
use crate::{Result, StateError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Loop lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LoopPhase {
    Stopped = 0,
    Running = 1,
    Paused = 2,
}

impl LoopPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopPhase::Stopped => "stopped",
            LoopPhase::Running => "running",
            LoopPhase::Paused => "paused",
        }
    }
}

impl fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of recording one failed tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    pub consecutive_errors: u32,
    /// The failure reached the threshold and the loop is now stopped
    pub tripped: bool,
}

/// Mutable loop state; always accessed under the owner's lock
#[derive(Debug, Clone)]
pub struct LoopState {
    phase: LoopPhase,
    consecutive_errors: u32,
    circuit_open: bool,
    ticks: u64,
    failed_ticks: u64,
    blocks_mined: u64,
    players_detected: u32,
    last_error: Option<String>,
    fps: f64,
    avg_tick_ms: f64,
    run_started: Option<Instant>,
    previous_runtime: Duration,
}

impl LoopState {
    pub fn new() -> Self {
        Self {
            phase: LoopPhase::Stopped,
            consecutive_errors: 0,
            circuit_open: false,
            ticks: 0,
            failed_ticks: 0,
            blocks_mined: 0,
            players_detected: 0,
            last_error: None,
            fps: 0.0,
            avg_tick_ms: 0.0,
            run_started: None,
            previous_runtime: Duration::ZERO,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn circuit_open(&self) -> bool {
        self.circuit_open
    }

    pub(crate) fn start(&mut self, now: Instant) -> Result<()> {
        self.require(LoopPhase::Stopped, "start")?;
        self.phase = LoopPhase::Running;
        self.consecutive_errors = 0;
        self.circuit_open = false;
        self.run_started = Some(now);
        Ok(())
    }

    pub(crate) fn pause(&mut self) -> Result<()> {
        self.require(LoopPhase::Running, "pause")?;
        self.phase = LoopPhase::Paused;
        Ok(())
    }

    pub(crate) fn resume(&mut self) -> Result<()> {
        self.require(LoopPhase::Paused, "resume")?;
        self.phase = LoopPhase::Running;
        Ok(())
    }

    pub(crate) fn stop(&mut self, reason: StopReason, now: Instant) -> Result<()> {
        if self.phase == LoopPhase::Stopped {
            return Err(StateError::InvalidTransition {
                from: self.phase,
                action: "stop",
            });
        }
        if let Some(started) = self.run_started.take() {
            self.previous_runtime += now.saturating_duration_since(started);
        }
        self.phase = LoopPhase::Stopped;
        self.circuit_open = reason == StopReason::CircuitBreaker;
        Ok(())
    }

    pub(crate) fn record_success(&mut self) {
        self.ticks += 1;
        self.consecutive_errors = 0;
    }

    /// Count a failed tick; reaching `threshold` stops the loop
    ///
    /// Failures that land after the loop was stopped are tallied but never trip.
    pub(crate) fn record_failure(
        &mut self,
        message: String,
        threshold: u32,
        now: Instant,
    ) -> FailureOutcome {
        self.ticks += 1;
        self.failed_ticks += 1;
        self.last_error = Some(message);

        if self.phase == LoopPhase::Stopped {
            return FailureOutcome {
                consecutive_errors: self.consecutive_errors,
                tripped: false,
            };
        }

        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
        let tripped = self.consecutive_errors >= threshold.max(1);
        if tripped {
            // Phase is Running or Paused here, so stop cannot fail
            let _ = self.stop(StopReason::CircuitBreaker, now);
        }

        FailureOutcome {
            consecutive_errors: self.consecutive_errors,
            tripped,
        }
    }

    pub(crate) fn record_paused_tick(&mut self) {
        self.ticks += 1;
    }

    pub(crate) fn add_blocks_mined(&mut self, count: u64) {
        self.blocks_mined += count;
    }

    pub(crate) fn set_players_detected(&mut self, count: u32) {
        self.players_detected = count;
    }

    pub(crate) fn set_performance(&mut self, fps: f64, avg_tick_ms: f64) {
        self.fps = fps;
        self.avg_tick_ms = avg_tick_ms;
    }

    /// Total time spent running or paused, including the current run
    pub fn runtime(&self, now: Instant) -> Duration {
        self.previous_runtime
            + self
                .run_started
                .map_or(Duration::ZERO, |started| now.saturating_duration_since(started))
    }

    pub fn snapshot(&self, now: Instant) -> LoopStatistics {
        let runtime_secs = self.runtime(now).as_secs();
        LoopStatistics {
            blocks_mined: self.blocks_mined,
            runtime_secs,
            players_detected: self.players_detected,
            efficiency: LoopStatistics::blocks_per_minute(self.blocks_mined, runtime_secs),
            ticks: self.ticks,
            failed_ticks: self.failed_ticks,
            consecutive_errors: self.consecutive_errors,
            last_error: self.last_error.clone(),
            fps: self.fps,
            avg_tick_ms: self.avg_tick_ms,
            phase: self.phase,
            paused: self.phase == LoopPhase::Paused,
            circuit_open: self.circuit_open,
        }
    }

    fn require(&self, expected: LoopPhase, action: &'static str) -> Result<()> {
        if self.phase != expected {
            return Err(StateError::InvalidTransition {
                from: self.phase,
                action,
            });
        }
        Ok(())
    }
}

impl Default for LoopState {
    fn default() -> Self {
        Self::new()
    }
}
