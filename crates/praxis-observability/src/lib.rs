// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # praxis-observability
//!
//! Logging initialisation for the Praxis crates with per-crate debug flag
//! support.
//!
//! ## Features
//! - `file-logging`: per-crate JSON log files in a timestamped run folder

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known Praxis crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "praxis-config",
    "praxis-runtime",
    "praxis-humanization",
    "praxis-state-manager",
    "praxis-supervisor",
];

/// Tracing target for a crate name (`praxis-runtime` -> `praxis_runtime`)
pub fn crate_target(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}
