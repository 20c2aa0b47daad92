// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Scripted collaborators shared by the integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use praxis::config::PraxisConfig;
use praxis::supervisor::{
    ActionCommand, ActionSink, CaptureProvider, Collaborators, DetectionProvider, Observation,
    ParsedMessage, PerceptionError, PixelFormat, RawFrame, SupervisoryLoop,
    TextObservationProvider,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Capture that replays scripted results, then returns blank frames forever
#[derive(Default)]
pub struct ScriptedCapture {
    script: Mutex<VecDeque<Result<RawFrame, PerceptionError>>>,
    calls: AtomicUsize,
}

impl ScriptedCapture {
    pub fn failing(times: usize) -> Self {
        let capture = Self::default();
        for i in 0..times {
            capture.push(Err(PerceptionError::new(format!("window lost ({})", i + 1))));
        }
        capture
    }

    pub fn push(&self, result: Result<RawFrame, PerceptionError>) {
        self.script.lock().push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CaptureProvider for ScriptedCapture {
    fn capture(&self) -> Result<RawFrame, PerceptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().pop_front() {
            Some(result) => result,
            None => Ok(RawFrame::blank(64, 48, PixelFormat::Rgb8)),
        }
    }
}

/// Detector returning a fixed scene
#[derive(Default)]
pub struct StaticScene {
    observations: Mutex<Vec<Observation>>,
    messages: Mutex<Vec<ParsedMessage>>,
}

impl StaticScene {
    pub fn with_observations(observations: Vec<Observation>) -> Self {
        Self {
            observations: Mutex::new(observations),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn set_messages(&self, messages: Vec<ParsedMessage>) {
        *self.messages.lock() = messages;
    }
}

impl DetectionProvider for StaticScene {
    fn detect(&self, _frame: &RawFrame) -> Result<Vec<Observation>, PerceptionError> {
        Ok(self.observations.lock().clone())
    }
}

impl TextObservationProvider for StaticScene {
    fn parse(&self, _frame: &RawFrame) -> Result<Vec<ParsedMessage>, PerceptionError> {
        Ok(self.messages.lock().clone())
    }
}

/// Sink that records commands without blocking on `Wait`
#[derive(Default)]
pub struct RecordingSink {
    commands: Mutex<Vec<ActionCommand>>,
}

impl RecordingSink {
    pub fn commands(&self) -> Vec<ActionCommand> {
        self.commands.lock().clone()
    }

    pub fn contains(&self, command: &ActionCommand) -> bool {
        self.commands.lock().iter().any(|c| c == command)
    }
}

impl ActionSink for RecordingSink {
    fn dispatch(&self, command: ActionCommand) {
        self.commands.lock().push(command);
    }
}

pub struct Harness {
    pub capture: Arc<ScriptedCapture>,
    pub scene: Arc<StaticScene>,
    pub sink: Arc<RecordingSink>,
    pub supervisor: SupervisoryLoop,
}

impl Harness {
    pub fn new(capture: ScriptedCapture, scene: StaticScene, config: PraxisConfig) -> Self {
        let capture = Arc::new(capture);
        let scene = Arc::new(scene);
        let sink = Arc::new(RecordingSink::default());
        let collaborators = Collaborators::new(
            capture.clone(),
            scene.clone(),
            scene.clone(),
            sink.clone(),
        );
        let supervisor =
            SupervisoryLoop::new(config, collaborators).expect("test config should be valid");
        Self {
            capture,
            scene,
            sink,
            supervisor,
        }
    }
}

/// Short delays and backoffs so a test sees many ticks per second
pub fn fast_config() -> PraxisConfig {
    let mut config = PraxisConfig::default();
    config.scheduler.workers = 3;
    config.supervisor.action_delay_ms = 10;
    config.supervisor.backoff_timeout_ms = 10;
    config.supervisor.backoff_perception_ms = 10;
    config.supervisor.backoff_unknown_ms = 10;
    config.humanization.seed = Some(42);
    config
}

/// Poll `condition` for up to five seconds
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}
