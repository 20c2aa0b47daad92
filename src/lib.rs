// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Praxis - Adaptive Perception-Action Control Loop
//!
//! Praxis runs a fixed-cadence loop that gathers several independent
//! observations of an external environment in parallel, turns them into one
//! decision, dispatches humanized actions, and paces itself from measured
//! throughput.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! praxis = "0.1"  # Default: supervisor included
//! ```
//!
//! ## Feature Flags
//!
//! - **`supervisor`** (default): the supervisory loop and its state manager
//! - **`file-logging`**: per-crate JSON log files with retention cleanup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use praxis::prelude::*;
//!
//! let config = load_config(None, None)?;
//! init_console_logging(&parse_debug_flags(), &LoggingConfig::default())?;
//!
//! let collaborators = Collaborators::new(capture, detector, parser, sink);
//! let supervisor = SupervisoryLoop::new(config, collaborators)?;
//! supervisor.start()?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: praxis-config, praxis-observability        │
//! │  (TOML config + overrides, tracing setup)               │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Runtime: praxis-runtime                                │
//! │  (TaskScheduler, FrameCache, PerformanceMonitor)        │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Algorithms: praxis-humanization                        │
//! │  (delays, fatigue, Bézier waypoints, pattern corpus)    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Supervision: praxis-state-manager, praxis-supervisor   │
//! │  (loop state, events, perception/decision loop)         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

pub use praxis_config as config;
pub use praxis_humanization as humanization;
pub use praxis_observability as observability;
pub use praxis_runtime as runtime;

#[cfg(feature = "supervisor")]
pub use praxis_state_manager as state_manager;

#[cfg(feature = "supervisor")]
pub use praxis_supervisor as supervisor;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{load_config, validate_config, PraxisConfig};
    pub use crate::humanization::{
        ActionKind, CorpusDocument, HumanizationGenerator, HumanizationParams, MovementSample,
        Point2,
    };
    pub use crate::observability::{
        init_console_logging, parse_debug_flags, CrateDebugFlags, LoggingConfig,
    };
    pub use crate::runtime::{Fingerprint, FrameCache, PerformanceMonitor, TaskScheduler};

    #[cfg(feature = "supervisor")]
    pub use crate::state_manager::{LoopEvent, LoopPhase, LoopStatistics, StopReason};

    #[cfg(feature = "supervisor")]
    pub use crate::supervisor::{
        ActionCommand, ActionSink, CaptureProvider, Collaborators, DetectionProvider,
        Observation, ParsedMessage, RawFrame, SupervisoryLoop, TextObservationProvider,
    };
}
