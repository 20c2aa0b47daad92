// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Task Scheduler
//!
//! Fixed-size worker pool fed by a single FIFO queue.
//!
//! ## Design
//! - Workers block on a shared crossbeam channel; `submit` wakes exactly one
//! - Every task gets a one-shot result slot ([`TaskHandle`])
//! - `shutdown` closes the queue, lets queued and in-flight work drain, then
//!   joins every worker
//! - A panicking task resolves its handle to [`TaskError::Lost`]; the worker
//!   survives and keeps serving the queue

use crate::error::{RuntimeError, TaskError};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Counters shared by all workers of one pool
#[derive(Debug, Default)]
struct PoolCounters {
    completed: AtomicU64,
    panicked: AtomicU64,
}

/// Worker pool executing submitted closures
pub struct TaskScheduler {
    name: String,
    sender: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
    counters: Arc<PoolCounters>,
}

impl TaskScheduler {
    /// Create a pool of `workers` threads named `praxis-worker-<n>`
    pub fn new(workers: usize) -> Result<Self, RuntimeError> {
        Self::with_name("praxis-worker", workers)
    }

    /// Create a pool whose threads are named `<name>-<n>`
    pub fn with_name(name: impl Into<String>, workers: usize) -> Result<Self, RuntimeError> {
        if workers == 0 {
            return Err(RuntimeError::InvalidWorkerCount(workers));
        }

        let name = name.into();
        let (tx, rx) = channel::unbounded::<Job>();
        let counters = Arc::new(PoolCounters::default());
        let mut handles = Vec::with_capacity(workers);

        for index in 0..workers {
            let rx = rx.clone();
            let counters = Arc::clone(&counters);
            let thread_name = format!("{}-{}", name, index);
            let spawned = thread::Builder::new()
                .name(thread_name.clone())
                .spawn(move || worker_loop(thread_name, rx, counters));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Close the queue so already-spawned workers exit
                    drop(tx);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(RuntimeError::SpawnFailed(e.to_string()));
                }
            }
        }

        info!("[SCHEDULER] Started pool '{}' with {} workers", name, workers);

        Ok(Self {
            name,
            sender: Mutex::new(Some(tx)),
            workers: Mutex::new(handles),
            worker_count: workers,
            counters,
        })
    }

    /// Queue `work` for execution on the next free worker
    ///
    /// # Errors
    ///
    /// `RuntimeError::PoolClosed` once `shutdown()` has been called.
    pub fn submit<F, T, E>(&self, work: F) -> Result<TaskHandle<T, E>, RuntimeError>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let (result_tx, result_rx) = channel::bounded(1);
        let job: Job = Box::new(move || {
            // Receiver may be gone if the caller dropped the handle
            let _ = result_tx.send(work());
        });

        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or(RuntimeError::PoolClosed)?;
        sender.send(job).map_err(|_| RuntimeError::PoolClosed)?;

        Ok(TaskHandle { result: result_rx })
    }

    /// Stop accepting work, drain the queue, and join every worker
    ///
    /// Idempotent. Must not be called from one of this pool's own tasks.
    pub fn shutdown(&self) {
        let sender = self.sender.lock().take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let handles: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                warn!("[SCHEDULER] Worker of pool '{}' exited abnormally", self.name);
            }
        }

        info!(
            "[SCHEDULER] Pool '{}' shut down ({} tasks completed, {} panicked)",
            self.name,
            self.completed_tasks(),
            self.counters.panicked.load(Ordering::Relaxed)
        );
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Tasks waiting in the queue (not yet picked up by a worker)
    pub fn queued(&self) -> usize {
        self.sender.lock().as_ref().map_or(0, |s| s.len())
    }

    /// Tasks that ran to completion or panicked
    pub fn completed_tasks(&self) -> u64 {
        self.counters.completed.load(Ordering::Relaxed)
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(name: String, rx: Receiver<Job>, counters: Arc<PoolCounters>) {
    debug!("[SCHEDULER] Worker {} ready", name);

    // recv fails only once the queue is closed and empty
    while let Ok(job) = rx.recv() {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            counters.panicked.fetch_add(1, Ordering::Relaxed);
            warn!("[SCHEDULER] Task panicked on worker {}", name);
        }
        counters.completed.fetch_add(1, Ordering::Relaxed);
    }

    debug!("[SCHEDULER] Worker {} exiting", name);
}

/// One-shot handle to a submitted task's result
///
/// Resolves exactly once; consuming `wait` is the only way to read it.
#[must_use = "a task handle does nothing unless waited on"]
pub struct TaskHandle<T, E> {
    result: Receiver<Result<T, E>>,
}

impl<T, E> TaskHandle<T, E> {
    /// Block until the task finishes
    pub fn wait(self) -> Result<T, TaskError<E>> {
        match self.result.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(TaskError::Work(e)),
            Err(_) => Err(TaskError::Lost),
        }
    }

    /// Whether a result is already waiting
    pub fn is_ready(&self) -> bool {
        !self.result.is_empty()
    }
}
