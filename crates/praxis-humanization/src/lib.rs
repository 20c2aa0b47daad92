// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # praxis-humanization
//!
//! Human-like timing and cursor motion for dispatched actions:
//! - per-category delays scaled by a bounded fatigue multiplier
//! - single-waypoint cubic Bézier cursor steps plus dispatch-time jitter
//! - a naturalness-ranked corpus of recorded movement samples

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod corpus;
pub mod error;
pub mod generator;
pub mod motion;
pub mod timing;

pub use corpus::{
    naturalness_score, smoothness, timing_variance, CorpusDocument, MovementSample,
    PatternCorpus, PatternRecord, ACCEPTANCE_THRESHOLD, CORPUS_CAPACITY,
};
pub use error::{HumanizationError, Result};
pub use generator::HumanizationGenerator;
pub use motion::{cubic_bezier, Point2, WAYPOINT_T};
pub use timing::{ActionKind, HumanizationParams, TimingState, FATIGUE_CEILING, FATIGUE_FLOOR};
