// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for Praxis
//!
//! Console logging is always available. With the `file-logging` feature,
//! [`init_logging`] also writes per-crate JSON log files with retention.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

fn build_filter(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string_with_default(&config.level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter directives: {}", directives))
}

/// Install a console subscriber
///
/// Fails if a global subscriber is already installed.
pub fn init_console_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<()> {
    let env_filter = build_filter(debug_flags, config)?;

    let console_layer = match config.format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
            .boxed(),
    };

    Registry::default()
        .with(console_layer.with_filter(env_filter))
        .try_init()
        .context("Failed to install console logging subscriber")
}

#[cfg(feature = "file-logging")]
pub use file::{init_logging, LoggingGuard};

#[cfg(feature = "file-logging")]
mod file {
    use super::*;
    use chrono::{Duration, NaiveDateTime, Utc};
    use std::path::{Path, PathBuf};
    use tracing_appender::rolling;

    const RUN_PREFIX: &str = "run_";
    const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Keeps the non-blocking file writers alive; logs flush on drop
    pub struct LoggingGuard {
        _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
        run_dir: PathBuf,
    }

    impl LoggingGuard {
        /// Folder holding this run's log files
        pub fn log_dir(&self) -> &Path {
            &self.run_dir
        }
    }

    /// Initialize console output plus per-crate JSON log files
    ///
    /// Creates a timestamped folder structure:
    /// ```text
    /// ./logs/
    ///   └── run_20250101_120000/
    ///       ├── praxis-runtime.log
    ///       ├── praxis-supervisor.log
    ///       └── praxis.log (combined)
    /// ```
    pub fn init_logging(
        debug_flags: &CrateDebugFlags,
        config: &LoggingConfig,
    ) -> Result<LoggingGuard> {
        let timestamp = Utc::now().format(RUN_TIMESTAMP_FORMAT);
        let run_dir = config.log_dir.join(format!("{}{}", RUN_PREFIX, timestamp));
        std::fs::create_dir_all(&run_dir)
            .with_context(|| format!("Failed to create log directory: {}", run_dir.display()))?;

        cleanup_old_logs(
            &config.log_dir,
            &run_dir,
            config.retention_days,
            config.retention_runs,
        )?;

        let env_filter = build_filter(debug_flags, config)?;
        let mut layers = Vec::new();
        let mut file_guards = Vec::new();

        layers.push(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_filter(env_filter)
                .boxed(),
        );

        for crate_name in crate::KNOWN_CRATES {
            let appender = rolling::daily(&run_dir, format!("{}.log", crate_name));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            file_guards.push(guard);

            let crate_filter = EnvFilter::try_new(format!(
                "off,{}=debug",
                crate::crate_target(crate_name)
            ))?;
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .with_filter(crate_filter)
                    .boxed(),
            );
        }

        let combined = rolling::daily(&run_dir, "praxis.log");
        let (combined_writer, combined_guard) = tracing_appender::non_blocking(combined);
        file_guards.push(combined_guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(combined_writer)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(build_filter(debug_flags, config)?)
                .boxed(),
        );

        Registry::default()
            .with(layers)
            .try_init()
            .context("Failed to install logging subscriber")?;

        Ok(LoggingGuard {
            _file_guards: file_guards,
            run_dir,
        })
    }

    /// Remove run folders past the age limit, then the oldest beyond `retention_runs`
    ///
    /// `current` is never removed.
    pub(crate) fn cleanup_old_logs(
        base_log_dir: &Path,
        current: &Path,
        retention_days: u64,
        retention_runs: usize,
    ) -> Result<()> {
        if !base_log_dir.exists() {
            return Ok(());
        }

        let cutoff = Utc::now().naive_utc() - Duration::days(retention_days as i64);
        let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();

        for entry in std::fs::read_dir(base_log_dir)? {
            let path = entry?.path();
            if !path.is_dir() || path == current {
                continue;
            }
            let stamp = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(RUN_PREFIX))
                .and_then(|s| NaiveDateTime::parse_from_str(s, RUN_TIMESTAMP_FORMAT).ok());
            if let Some(stamp) = stamp {
                runs.push((path, stamp));
            }
        }

        // Newest first; everything past the keep window or the cutoff goes
        runs.sort_by(|a, b| b.1.cmp(&a.1));
        let keep_previous = retention_runs.saturating_sub(1);

        for (index, (path, stamp)) in runs.iter().enumerate() {
            if index >= keep_previous || *stamp < cutoff {
                if let Err(e) = std::fs::remove_dir_all(path) {
                    eprintln!(
                        "Warning: Failed to remove old log directory {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use tempfile::tempdir;

        #[test]
        fn test_cleanup_keeps_newest_runs() {
            let dir = tempdir().unwrap();
            let now = Utc::now().naive_utc();
            let mut created = Vec::new();
            for minutes in 1..=5 {
                let stamp = (now - Duration::minutes(minutes)).format(RUN_TIMESTAMP_FORMAT);
                let path = dir.path().join(format!("{}{}", RUN_PREFIX, stamp));
                std::fs::create_dir_all(&path).unwrap();
                created.push(path);
            }
            let current = dir.path().join(format!(
                "{}{}",
                RUN_PREFIX,
                now.format(RUN_TIMESTAMP_FORMAT)
            ));
            std::fs::create_dir_all(&current).unwrap();

            cleanup_old_logs(dir.path(), &current, 30, 3).unwrap();

            assert!(current.exists());
            assert!(created[0].exists());
            assert!(created[1].exists());
            assert!(!created[2].exists());
            assert!(!created[4].exists());
        }

        #[test]
        fn test_cleanup_drops_expired_runs() {
            let dir = tempdir().unwrap();
            let old = Utc::now().naive_utc() - Duration::days(40);
            let old_path = dir
                .path()
                .join(format!("{}{}", RUN_PREFIX, old.format(RUN_TIMESTAMP_FORMAT)));
            std::fs::create_dir_all(&old_path).unwrap();
            let unrelated = dir.path().join("notes");
            std::fs::create_dir_all(&unrelated).unwrap();

            let current = dir.path().join("run_current");
            cleanup_old_logs(dir.path(), &current, 30, 10).unwrap();

            assert!(!old_path.exists());
            assert!(unrelated.exists());
        }
    }
}
