// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HumanizationError {
    #[error("Corpus I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corpus document is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HumanizationError>;
