// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Praxis State Manager
//!
//! Lifecycle phase, circuit-breaker bookkeeping and run statistics for the
//! supervisory loop, shared between the loop thread and its controllers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   SharedLoopState (Arc, cloneable)  │
//! │   ├─ Mutex<LoopState>               │  ← phase + counters, short critical sections
//! │   └─ EventBus                       │  ← published after the lock is released
//! └─────────────────────────────────────┘
//!           ↓ snapshot()
//! ┌─────────────────────────────────────┐
//! │   LoopStatistics (owned copy)       │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use praxis_state_manager::{LoopEvent, LoopPhase, SharedLoopState, StopReason};
//!
//! let state = SharedLoopState::new();
//! let events = state.subscribe();
//!
//! state.start()?;
//! assert_eq!(state.phase(), LoopPhase::Running);
//! state.stop(StopReason::Requested)?;
//!
//! assert_eq!(events.try_recv(), Ok(LoopEvent::Started));
//! # Ok::<(), praxis_state_manager::StateError>(())
//! ```

pub mod events;
pub mod loop_state;
pub mod statistics;

pub use events::{EventBus, LoopEvent, StopReason};
pub use loop_state::{FailureOutcome, LoopPhase, LoopState};
pub use statistics::LoopStatistics;

use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Cannot {action} while {from}")]
    InvalidTransition {
        from: LoopPhase,
        action: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, StateError>;

struct Inner {
    state: Mutex<LoopState>,
    events: EventBus,
}

/// Cloneable handle to one loop's state
#[derive(Clone)]
pub struct SharedLoopState {
    inner: Arc<Inner>,
}

impl SharedLoopState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(LoopState::new()),
                events: EventBus::new(),
            }),
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.inner.state.lock().phase()
    }

    pub fn is_running(&self) -> bool {
        self.phase() != LoopPhase::Stopped
    }

    pub fn is_paused(&self) -> bool {
        self.phase() == LoopPhase::Paused
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.inner.state.lock().consecutive_errors()
    }

    /// Stopped → Running; clears the breaker and the consecutive-error count
    pub fn start(&self) -> Result<()> {
        self.transition(LoopEvent::Started, |s| s.start(Instant::now()))
    }

    pub fn pause(&self) -> Result<()> {
        self.transition(LoopEvent::Paused, LoopState::pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.transition(LoopEvent::Resumed, LoopState::resume)
    }

    pub fn stop(&self, reason: StopReason) -> Result<()> {
        self.transition(LoopEvent::Stopped { reason }, |s| {
            s.stop(reason, Instant::now())
        })
    }

    pub fn record_success(&self) {
        self.inner.state.lock().record_success();
    }

    /// Count a failed tick; publishes `Stopped { CircuitBreaker }` when it trips
    pub fn record_failure(&self, message: impl Into<String>, threshold: u32) -> FailureOutcome {
        let outcome = self
            .inner
            .state
            .lock()
            .record_failure(message.into(), threshold, Instant::now());
        if outcome.tripped {
            self.inner.events.publish(LoopEvent::Stopped {
                reason: StopReason::CircuitBreaker,
            });
        }
        outcome
    }

    /// A tick that ran while paused; leaves the error counter alone
    pub fn record_paused_tick(&self) {
        self.inner.state.lock().record_paused_tick();
    }

    pub fn add_blocks_mined(&self, count: u64) {
        self.inner.state.lock().add_blocks_mined(count);
    }

    pub fn set_players_detected(&self, count: u32) {
        self.inner.state.lock().set_players_detected(count);
    }

    pub fn set_performance(&self, fps: f64, avg_tick_ms: f64) {
        self.inner.state.lock().set_performance(fps, avg_tick_ms);
    }

    pub fn snapshot(&self) -> LoopStatistics {
        self.inner.state.lock().snapshot(Instant::now())
    }

    pub fn subscribe(&self) -> Receiver<LoopEvent> {
        self.inner.events.subscribe()
    }

    fn transition<F>(&self, event: LoopEvent, apply: F) -> Result<()>
    where
        F: FnOnce(&mut LoopState) -> Result<()>,
    {
        let outcome = apply(&mut self.inner.state.lock());
        match outcome {
            Ok(()) => {
                debug!("[LOOP-STATE] {:?}", event);
                self.inner.events.publish(event);
                Ok(())
            }
            Err(e) => {
                debug!("[LOOP-STATE] Rejected: {}", e);
                Err(e)
            }
        }
    }
}

impl Default for SharedLoopState {
    fn default() -> Self {
        Self::new()
    }
}
