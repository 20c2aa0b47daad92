// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Perception Fan-out
//!
//! Each tick submits three tasks to the worker pool and joins all of them
//! before returning:
//!
//! ```text
//!            ┌─▶ capture(now)                   ─┐
//! gather() ──┼─▶ detect(previous)  [FrameCache]  ├──▶ barrier ──▶ Perceived
//!            └─▶ parse(previous)                ─┘
//! ```
//!
//! Detection and parsing read the frame captured by the previous tick, so they
//! never wait on the capture running beside them. The first tick of a run sees
//! no observations.

use crate::error::{PerceptionStage, TickError};
use crate::providers::{
    CaptureProvider, Collaborators, DetectionProvider, Observation, ParsedMessage, RawFrame,
    TextObservationProvider,
};
use praxis_runtime::{FrameCache, TaskHandle, TaskScheduler};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Detector output shared between cache entries and ticks
pub type Observations = Arc<[Observation]>;

pub type DetectionCache = FrameCache<Observations>;

/// Joined result of one tick's perception tasks
#[derive(Debug, Clone)]
pub struct Perceived {
    pub observations: Observations,
    pub messages: Vec<ParsedMessage>,
}

impl Perceived {
    pub fn nothing() -> Self {
        Self {
            observations: Arc::from(Vec::new()),
            messages: Vec::new(),
        }
    }
}

pub struct Perception {
    capture: Arc<dyn CaptureProvider>,
    detector: Arc<dyn DetectionProvider>,
    parser: Arc<dyn TextObservationProvider>,
    cache: Arc<DetectionCache>,
    previous: Option<Arc<RawFrame>>,
}

impl Perception {
    pub fn new(collaborators: &Collaborators, cache: Arc<DetectionCache>) -> Self {
        Self {
            capture: Arc::clone(&collaborators.capture),
            detector: Arc::clone(&collaborators.detector),
            parser: Arc::clone(&collaborators.parser),
            cache,
            previous: None,
        }
    }

    /// Frame the next tick's detector and parser will read
    pub fn previous_frame(&self) -> Option<&Arc<RawFrame>> {
        self.previous.as_ref()
    }

    /// Forget the carried frame so the next tick starts blind
    pub fn reset(&mut self) {
        self.previous = None;
    }

    pub fn set_cache(&mut self, cache: Arc<DetectionCache>) {
        self.cache = cache;
    }

    /// Run the three perception tasks and wait for all of them
    ///
    /// A successful capture replaces the carried frame even when detection or
    /// parsing of the older frame failed.
    pub fn gather(
        &mut self,
        scheduler: &TaskScheduler,
        capture_timeout: Duration,
    ) -> Result<Perceived, TickError> {
        let capture = Arc::clone(&self.capture);
        let capture_task: TaskHandle<Arc<RawFrame>, TickError> =
            scheduler.submit(move || capture_frame(capture.as_ref(), capture_timeout))?;

        let mut detect_task = None;
        let mut parse_task = None;
        if let Some(frame) = &self.previous {
            let detector = Arc::clone(&self.detector);
            let cache = Arc::clone(&self.cache);
            let detect_frame = Arc::clone(frame);
            detect_task = Some(scheduler.submit(move || {
                cache
                    .get_or_compute(detect_frame.as_ref(), |f| {
                        detector.detect(f).map(Observations::from)
                    })
                    .map_err(|e| TickError::perception(PerceptionStage::Detection, e))
            })?);

            let parser = Arc::clone(&self.parser);
            let parse_frame = Arc::clone(frame);
            parse_task = Some(scheduler.submit(move || {
                parser
                    .parse(parse_frame.as_ref())
                    .map_err(|e| TickError::perception(PerceptionStage::TextParsing, e))
            })?);
        }

        // Barrier: every handle is resolved before any error is reported
        let captured = capture_task.wait().map_err(TickError::from_task);
        let observations = match detect_task {
            Some(handle) => handle.wait().map_err(TickError::from_task),
            None => Ok(Perceived::nothing().observations),
        };
        let messages = match parse_task {
            Some(handle) => handle.wait().map_err(TickError::from_task),
            None => Ok(Vec::new()),
        };

        self.previous = Some(captured?);
        let perceived = Perceived {
            observations: observations?,
            messages: messages?,
        };
        trace!(
            "[PERCEPTION] {} observations, {} messages",
            perceived.observations.len(),
            perceived.messages.len()
        );
        Ok(perceived)
    }
}

/// Deadline is checked after the provider returns; a slow capture still occupies its worker
fn capture_frame(
    provider: &dyn CaptureProvider,
    timeout: Duration,
) -> Result<Arc<RawFrame>, TickError> {
    let started = Instant::now();
    let frame = provider
        .capture()
        .map_err(|e| TickError::perception(PerceptionStage::Capture, e))?;
    let elapsed = started.elapsed();

    if elapsed > timeout {
        return Err(TickError::CaptureTimeout {
            elapsed_ms: elapsed.as_millis() as u64,
            timeout_ms: timeout.as_millis() as u64,
        });
    }
    if frame.is_empty() {
        return Err(TickError::EmptyCapture);
    }
    Ok(Arc::new(frame))
}
