// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Runtime error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Submission after `shutdown()`
    #[error("Task pool is closed")]
    PoolClosed,

    #[error("Invalid worker count {0}: at least one worker is required")]
    InvalidWorkerCount(usize),

    #[error("Failed to spawn worker thread: {0}")]
    SpawnFailed(String),
}

/// Outcome of waiting on a task that did not produce a value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError<E> {
    /// The work itself returned an error
    #[error("Task failed: {0}")]
    Work(E),

    /// The worker dropped the result slot without filling it (the work panicked)
    #[error("Task result lost: work panicked before producing a result")]
    Lost,
}

impl<E> TaskError<E> {
    /// Convert the inner work error, keeping `Lost` as is
    pub fn map_work<F, E2>(self, f: F) -> TaskError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            TaskError::Work(e) => TaskError::Work(f(e)),
            TaskError::Lost => TaskError::Lost,
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
