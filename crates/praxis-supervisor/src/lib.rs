// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # praxis-supervisor
//!
//! The supervisory perception-action loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────── loop thread ─────────────────────┐
//! │ frame_start → perception fan-out ─┐                  │
//! │                  (worker pool)    │ barrier          │
//! │               decision / action ◀─┘                  │
//! │               pacing sleep (adaptive or backoff)     │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use praxis_supervisor::{Collaborators, SupervisoryLoop};
//!
//! let supervisor = SupervisoryLoop::new(config, Collaborators::new(capture, detector, parser, sink))?;
//! let events = supervisor.subscribe();
//! supervisor.start()?;
//! // ...
//! println!("{:?}", supervisor.status());
//! supervisor.stop();
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod decision;
pub mod error;
pub mod perception;
pub mod providers;
pub mod runner;

pub use decision::{is_eligible, mentions_bot, mining_time, DecisionEngine, MiningState, TickOutcome};
pub use error::{FailureCategory, PerceptionError, PerceptionStage, Result, SupervisorError, TickError};
pub use perception::{DetectionCache, Perceived, Perception};
pub use providers::{
    ActionCommand, ActionSink, BlockKind, BlockObservation, CaptureProvider, Collaborators,
    DetectionProvider, MouseButton, Observation, ParsedMessage, PixelFormat, PlayerObservation,
    RawFrame, Rect, TextObservationProvider,
};
pub use runner::{adaptive_delay, backoff_for, SupervisoryLoop};
