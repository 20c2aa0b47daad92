// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # praxis-runtime
//!
//! Execution primitives for the supervisory loop:
//! - [`TaskScheduler`]: fixed worker pool with one-shot result handles
//! - [`FrameCache`]: fingerprint-keyed TTL cache with per-key single computation
//! - [`PerformanceMonitor`]: rolling tick-duration window and FPS estimate

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod frame_cache;
pub mod performance;
pub mod scheduler;

pub use error::{Result, RuntimeError, TaskError};
pub use frame_cache::{CacheStats, Fingerprint, FrameCache, DEFAULT_TTL};
pub use performance::{PerformanceMonitor, FRAME_WINDOW};
pub use scheduler::{TaskHandle, TaskScheduler};
