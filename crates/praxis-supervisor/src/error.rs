// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Tick failure taxonomy and loop control errors

use praxis_config::ConfigError;
use praxis_runtime::{RuntimeError, TaskError};
use praxis_state_manager::StateError;
use std::fmt;
use thiserror::Error;

/// Perception stage that raised an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerceptionStage {
    Capture,
    Detection,
    TextParsing,
}

impl fmt::Display for PerceptionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PerceptionStage::Capture => "capture",
            PerceptionStage::Detection => "detection",
            PerceptionStage::TextParsing => "text parsing",
        })
    }
}

/// Error raised by an external collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct PerceptionError(pub String);

impl PerceptionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Backoff class of a failed tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    Timeout,
    Perception,
    Unknown,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureCategory::Timeout => "timeout",
            FailureCategory::Perception => "perception",
            FailureCategory::Unknown => "unknown",
        })
    }
}

/// Why one tick failed. Never escapes the loop thread.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickError {
    #[error("Capture took {elapsed_ms} ms, exceeding the {timeout_ms} ms deadline")]
    CaptureTimeout { elapsed_ms: u64, timeout_ms: u64 },

    #[error("Captured frame is empty")]
    EmptyCapture,

    #[error("Perception failed during {stage}: {source}")]
    PerceptionFailure {
        stage: PerceptionStage,
        source: PerceptionError,
    },

    #[error("Unclassified tick failure: {0}")]
    Unknown(String),
}

impl TickError {
    pub fn perception(stage: PerceptionStage, source: PerceptionError) -> Self {
        TickError::PerceptionFailure { stage, source }
    }

    pub fn category(&self) -> FailureCategory {
        match self {
            TickError::CaptureTimeout { .. } => FailureCategory::Timeout,
            TickError::EmptyCapture | TickError::PerceptionFailure { .. } => {
                FailureCategory::Perception
            }
            TickError::Unknown(_) => FailureCategory::Unknown,
        }
    }

    /// Flatten the outcome of waiting on a perception task
    pub fn from_task(error: TaskError<TickError>) -> Self {
        match error {
            TaskError::Work(e) => e,
            TaskError::Lost => TickError::Unknown("perception task panicked".to_string()),
        }
    }
}

impl From<RuntimeError> for TickError {
    fn from(err: RuntimeError) -> Self {
        TickError::Unknown(format!("scheduler: {}", err))
    }
}

/// Errors returned by [`SupervisoryLoop`](crate::SupervisoryLoop) control calls
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Supervisory loop is already running")]
    AlreadyRunning,

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to spawn supervisory loop thread: {0}")]
    SpawnFailed(String),
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
