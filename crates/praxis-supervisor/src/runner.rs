// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Supervisory Loop Runner
//!
//! Runs perception → decision → pacing in a dedicated thread.
//!
//! ## Design
//! - One loop thread plus a worker pool created per run; `stop()` joins the
//!   loop thread, which drains and joins the pool before exiting
//! - Configuration is an immutable `Arc` snapshot; updates are picked up at the
//!   top of the next tick
//! - Decision state (fatigue, RNG, corpus, mining target) survives restarts
//! - Failed ticks back off by category; `max_consecutive_errors` in a row
//!   stops the loop until `start()` is called again
//! - Sleep is chunked so `stop()` is observed within ~50 ms

use crate::decision::DecisionEngine;
use crate::error::{FailureCategory, Result, SupervisorError, TickError};
use crate::perception::{DetectionCache, Perception};
use crate::providers::{ActionSink, Collaborators};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use praxis_config::{validate_config, ConfigError, PraxisConfig, SupervisorConfig};
use praxis_humanization::{CorpusDocument, HumanizationGenerator, HumanizationParams};
use praxis_runtime::{CacheStats, PerformanceMonitor, TaskScheduler};
use praxis_state_manager::{LoopEvent, LoopPhase, LoopStatistics, SharedLoopState, StopReason};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const SLEEP_CHUNK: Duration = Duration::from_millis(50);
const STATS_INTERVAL: Duration = Duration::from_secs(5);
const SLOW_PERCEPTION: Duration = Duration::from_millis(100);

type ConfigSlot = Arc<RwLock<Arc<PraxisConfig>>>;

/// Decision and perception state carried from one run to the next
struct Carryover {
    perception: Perception,
    engine: DecisionEngine,
}

pub struct SupervisoryLoop {
    collaborators: Collaborators,
    config: ConfigSlot,
    state: SharedLoopState,
    cache: Mutex<Arc<DetectionCache>>,
    corpus_tx: Sender<CorpusDocument>,
    corpus_rx: Receiver<CorpusDocument>,
    thread_handle: Mutex<Option<JoinHandle<Carryover>>>,
    parked: Mutex<Option<Carryover>>,
}

impl SupervisoryLoop {
    /// Build a stopped loop; `config` must pass validation
    pub fn new(config: PraxisConfig, collaborators: Collaborators) -> Result<Self> {
        validate_config(&config)?;

        let cache = Arc::new(DetectionCache::new(Duration::from_millis(config.cache.ttl_ms)));
        let humanizer = HumanizationGenerator::new(HumanizationParams::from(&config.humanization));
        let carryover = Carryover {
            perception: Perception::new(&collaborators, Arc::clone(&cache)),
            engine: DecisionEngine::new(humanizer),
        };
        let (corpus_tx, corpus_rx) = channel::unbounded();

        Ok(Self {
            collaborators,
            config: Arc::new(RwLock::new(Arc::new(config))),
            state: SharedLoopState::new(),
            cache: Mutex::new(cache),
            corpus_tx,
            corpus_rx,
            thread_handle: Mutex::new(None),
            parked: Mutex::new(Some(carryover)),
        })
    }

    /// Spawn the loop thread (Stopped → Running)
    ///
    /// Also restarts a loop halted by the circuit breaker.
    pub fn start(&self) -> Result<()> {
        let mut handle_slot = self.thread_handle.lock();
        if self.state.is_running() {
            return Err(SupervisorError::AlreadyRunning);
        }
        if let Some(finished) = handle_slot.take() {
            self.park(finished);
        }

        let config = self.config();
        let scheduler = TaskScheduler::with_name("praxis-perception", config.scheduler.workers)?;
        self.state.start()?;

        let cache = self.cache_for(&config);
        let mut carryover = match self.parked.lock().take() {
            Some(carryover) => carryover,
            None => self.fresh_carryover(&config, Arc::clone(&cache)),
        };
        carryover.perception.set_cache(Arc::clone(&cache));
        carryover
            .engine
            .set_humanization(HumanizationParams::from(&config.humanization));

        info!(
            "[SUPERVISOR] Starting supervisory loop ({} workers, base delay {} ms)",
            config.scheduler.workers, config.supervisor.action_delay_ms
        );

        let context = TickContext {
            scheduler,
            perception: carryover.perception,
            engine: carryover.engine,
            monitor: PerformanceMonitor::new(),
            cache,
            applied: config,
            config: Arc::clone(&self.config),
            state: self.state.clone(),
            sink: Arc::clone(&self.collaborators.sink),
            corpus: self.corpus_rx.clone(),
        };

        let spawned = thread::Builder::new()
            .name("praxis-supervisor".to_string())
            .spawn(move || run_loop(context));

        match spawned {
            Ok(handle) => {
                *handle_slot = Some(handle);
                info!("[SUPERVISOR] Supervisory loop started");
                Ok(())
            }
            Err(e) => {
                let _ = self.state.stop(StopReason::Requested);
                Err(SupervisorError::SpawnFailed(e.to_string()))
            }
        }
    }

    /// Stop the loop and wait for its thread and worker pool to exit
    ///
    /// Idempotent. In-flight perception tasks finish first.
    pub fn stop(&self) {
        let mut handle_slot = self.thread_handle.lock();
        if self.state.stop(StopReason::Requested).is_ok() {
            info!("[SUPERVISOR] Stopping supervisory loop...");
        }

        if let Some(handle) = handle_slot.take() {
            self.park(handle);
            info!("[SUPERVISOR] Supervisory loop stopped");
        }
    }

    pub fn pause(&self) -> Result<()> {
        self.state.pause()?;
        info!("[SUPERVISOR] Paused");
        Ok(())
    }

    pub fn resume(&self) -> Result<()> {
        self.state.resume()?;
        info!("[SUPERVISOR] Resumed");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    pub fn phase(&self) -> LoopPhase {
        self.state.phase()
    }

    /// Copy of the current statistics
    pub fn status(&self) -> LoopStatistics {
        self.state.snapshot()
    }

    /// Receive `Started`, `Paused`, `Resumed` and `Stopped` transitions
    pub fn subscribe(&self) -> Receiver<LoopEvent> {
        self.state.subscribe()
    }

    pub fn config(&self) -> Arc<PraxisConfig> {
        Arc::clone(&*self.config.read())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    /// Replace the configuration
    ///
    /// A rejected config is never applied and does not count as a tick failure.
    /// Worker count and cache TTL take effect at the next `start()`.
    pub fn update_config(&self, config: PraxisConfig) -> std::result::Result<(), ConfigError> {
        self.modify_config(|current| {
            *current = config;
            true
        })
        .map(|_| ())
    }

    /// Returns `false` when the player was already known
    pub fn add_known_player(&self, name: &str) -> std::result::Result<bool, ConfigError> {
        self.modify_config(|config| {
            let known = &mut config.behavior.known_players;
            if known.iter().any(|p| p.eq_ignore_ascii_case(name)) {
                return false;
            }
            known.push(name.to_string());
            true
        })
    }

    /// Returns `false` when the player was not known
    pub fn remove_known_player(&self, name: &str) -> std::result::Result<bool, ConfigError> {
        self.modify_config(|config| {
            let known = &mut config.behavior.known_players;
            let before = known.len();
            known.retain(|p| !p.eq_ignore_ascii_case(name));
            known.len() != before
        })
    }

    /// Queue a corpus document for the loop thread to ingest
    pub fn ingest_corpus(&self, document: CorpusDocument) {
        // Receiver lives in self, so the channel never disconnects
        let _ = self.corpus_tx.send(document);
    }

    fn modify_config<F>(&self, apply: F) -> std::result::Result<bool, ConfigError>
    where
        F: FnOnce(&mut PraxisConfig) -> bool,
    {
        let mut slot = self.config.write();
        let mut candidate = PraxisConfig::clone(&slot);
        if !apply(&mut candidate) {
            return Ok(false);
        }
        if let Err(e) = validate_config(&candidate) {
            warn!("[SUPERVISOR] Rejected configuration update: {}", e);
            return Err(e);
        }
        *slot = Arc::new(candidate);
        info!("[SUPERVISOR] Configuration updated");
        Ok(true)
    }

    fn cache_for(&self, config: &PraxisConfig) -> Arc<DetectionCache> {
        let ttl = Duration::from_millis(config.cache.ttl_ms);
        let mut slot = self.cache.lock();
        if slot.ttl() != ttl {
            *slot = Arc::new(DetectionCache::new(ttl));
        }
        Arc::clone(&slot)
    }

    fn fresh_carryover(&self, config: &PraxisConfig, cache: Arc<DetectionCache>) -> Carryover {
        let humanizer = HumanizationGenerator::new(HumanizationParams::from(&config.humanization));
        Carryover {
            perception: Perception::new(&self.collaborators, cache),
            engine: DecisionEngine::new(humanizer),
        }
    }

    fn park(&self, handle: JoinHandle<Carryover>) {
        match handle.join() {
            Ok(carryover) => *self.parked.lock() = Some(carryover),
            Err(_) => error!("[SUPERVISOR] Loop thread panicked; decision state discarded"),
        }
    }
}

impl Drop for SupervisoryLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Inter-tick delay: base when throughput is above threshold, doubled otherwise
pub fn adaptive_delay(base: Duration, fps: f64, fps_threshold: f64) -> Duration {
    if fps > fps_threshold {
        base
    } else {
        base * 2
    }
}

/// Sleep applied after a failed tick instead of the adaptive delay
pub fn backoff_for(category: FailureCategory, config: &SupervisorConfig) -> Duration {
    let ms = match category {
        FailureCategory::Timeout => config.backoff_timeout_ms,
        FailureCategory::Perception => config.backoff_perception_ms,
        FailureCategory::Unknown => config.backoff_unknown_ms,
    };
    Duration::from_millis(ms)
}

/// Everything the loop thread owns for one run
struct TickContext {
    scheduler: TaskScheduler,
    perception: Perception,
    engine: DecisionEngine,
    monitor: PerformanceMonitor,
    cache: Arc<DetectionCache>,
    applied: Arc<PraxisConfig>,
    config: ConfigSlot,
    state: SharedLoopState,
    sink: Arc<dyn ActionSink>,
    corpus: Receiver<CorpusDocument>,
}

impl TickContext {
    /// Pick up a newer config snapshot, if one was published
    fn refresh_config(&mut self) -> Arc<PraxisConfig> {
        let current = Arc::clone(&*self.config.read());
        if !Arc::ptr_eq(&current, &self.applied) {
            if current.humanization != self.applied.humanization {
                self.engine
                    .set_humanization(HumanizationParams::from(&current.humanization));
            }
            debug!("[SUPERVISOR] Applied updated configuration");
            self.applied = Arc::clone(&current);
        }
        current
    }

    fn drain_corpus(&mut self) {
        for document in self.corpus.try_iter() {
            let accepted = self.engine.humanizer_mut().ingest_corpus(document);
            info!("[SUPERVISOR] Ingested {} corpus patterns", accepted);
        }
    }

    /// Steps 3-5: perception fan-out, barrier, decision/action
    ///
    /// Returns the time spent waiting on perception.
    fn tick(&mut self, config: &PraxisConfig) -> std::result::Result<Duration, TickError> {
        let started = Instant::now();
        let timeout = Duration::from_millis(config.supervisor.capture_timeout_ms);
        let perceived = self.perception.gather(&self.scheduler, timeout)?;
        let perception_time = started.elapsed();

        let outcome = self
            .engine
            .decide(&perceived, config, self.sink.as_ref(), Instant::now());
        self.state.add_blocks_mined(outcome.blocks_mined);
        self.state.set_players_detected(outcome.players_detected);
        Ok(perception_time)
    }

    fn guarded_tick(&mut self, config: &PraxisConfig) -> std::result::Result<Duration, TickError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.tick(config))) {
            Ok(result) => result,
            Err(payload) => Err(TickError::Unknown(panic_message(&*payload))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("tick panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("tick panicked: {}", s)
    } else {
        "tick panicked".to_string()
    }
}

/// Main loop body (runs in the dedicated thread)
fn run_loop(mut ctx: TickContext) -> Carryover {
    info!(
        "[SUPERVISOR] Loop thread running with {} perception workers",
        ctx.scheduler.worker_count()
    );

    let mut tick_count = 0u64;
    let mut failures_since_stats = 0u64;
    let mut last_stats_time = Instant::now();
    ctx.monitor.reset();

    while ctx.state.is_running() {
        let tick_start = Instant::now();
        ctx.monitor.frame_start_at(tick_start);

        let config = ctx.refresh_config();
        ctx.drain_corpus();
        let base = Duration::from_millis(config.supervisor.action_delay_ms);

        let pause_for = if ctx.state.is_paused() {
            ctx.state.record_paused_tick();
            base
        } else {
            match ctx.guarded_tick(&config) {
                Ok(perception_time) => {
                    ctx.state.record_success();
                    if perception_time > SLOW_PERCEPTION {
                        warn!(
                            "[SUPERVISOR] Slow tick: perception took {:.1} ms",
                            perception_time.as_secs_f64() * 1000.0
                        );
                    }
                    adaptive_delay(base, ctx.monitor.fps(), config.supervisor.fps_threshold)
                }
                Err(e) => {
                    failures_since_stats += 1;
                    let category = e.category();
                    let threshold = config.supervisor.max_consecutive_errors;
                    let outcome = ctx.state.record_failure(e.to_string(), threshold);
                    warn!(
                        "[SUPERVISOR] Tick failed [{}] ({}/{} consecutive): {}",
                        category, outcome.consecutive_errors, threshold, e
                    );
                    if outcome.tripped {
                        error!(
                            "[SUPERVISOR] Circuit breaker tripped after {} consecutive failures; loop halted until restarted",
                            outcome.consecutive_errors
                        );
                        tick_count += 1;
                        break;
                    }
                    backoff_for(category, &config.supervisor)
                }
            }
        };

        tick_count += 1;
        ctx.state
            .set_performance(ctx.monitor.fps(), ctx.monitor.average_frame_time());

        if last_stats_time.elapsed() >= STATS_INTERVAL {
            let cache = ctx.cache.stats();
            debug!(
                "[SUPERVISOR] Stats: tick #{} | {:.1} FPS | avg {:.1} ms | {} failed | cache hit rate {:.0}%",
                tick_count,
                ctx.monitor.fps(),
                ctx.monitor.average_frame_time(),
                failures_since_stats,
                cache.hit_rate() * 100.0
            );
            last_stats_time = Instant::now();
            failures_since_stats = 0;
        }

        sleep_while_running(&ctx.state, pause_for);
    }

    ctx.scheduler.shutdown();
    info!("[SUPERVISOR] Loop thread exited after {} ticks", tick_count);

    Carryover {
        perception: ctx.perception,
        engine: ctx.engine,
    }
}

fn sleep_while_running(state: &SharedLoopState, duration: Duration) {
    let deadline = Instant::now() + duration;
    while state.is_running() {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep((deadline - now).min(SLEEP_CHUNK));
    }
}
