// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Humanization Generator
//!
//! Stateful source of humanized delays and cursor waypoints.
//!
//! ## Design
//! - Owns its RNG, fatigue state and learned corpus; none of it is shared
//! - Must be driven from a single thread (the action phase). It is `Send`
//!   so it can move into that thread, and holds no locks.
//! - `movement_waypoint` returns ONE point at t = 0.8 along a perturbed cubic
//!   Bézier curve; callers step repeatedly to approximate a trajectory

use crate::corpus::{self, CorpusDocument, MovementSample, PatternCorpus};
use crate::motion::{cubic_bezier, Point2, WAYPOINT_T};
use crate::timing::{ActionKind, HumanizationParams, TimingState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

const CURVE_SPREAD: f64 = 0.3;
const FIRST_CONTROL_AT: f64 = 0.3;
const SECOND_CONTROL_AT: f64 = 0.7;
const FIRST_CONTROL_WOBBLE: f64 = 0.2;
const SECOND_CONTROL_WOBBLE: f64 = 0.15;
const JITTER_PX: f64 = 1.0;
const LEVEL_DELAY_SCALE: f64 = 0.5;

pub struct HumanizationGenerator {
    params: HumanizationParams,
    timing: TimingState,
    rng: StdRng,
    corpus: PatternCorpus,
}

impl HumanizationGenerator {
    pub fn new(params: HumanizationParams) -> Self {
        Self::starting_at(params, Instant::now())
    }

    /// Generator whose idle clock starts at `origin`
    pub fn starting_at(params: HumanizationParams, origin: Instant) -> Self {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            params,
            timing: TimingState::new(origin),
            rng,
            corpus: PatternCorpus::new(),
        }
    }

    pub fn params(&self) -> &HumanizationParams {
        &self.params
    }

    /// Replace parameters, keeping fatigue, RNG and corpus
    pub fn set_params(&mut self, params: HumanizationParams) {
        if params.seed != self.params.seed {
            if let Some(seed) = params.seed {
                self.rng = StdRng::seed_from_u64(seed);
            }
        }
        self.params = params;
    }

    pub fn timing(&self) -> &TimingState {
        &self.timing
    }

    pub fn fatigue(&self) -> f64 {
        self.timing.fatigue_multiplier()
    }

    /// Humanized delay for `kind`, advancing fatigue as of now
    pub fn delay(&mut self, kind: ActionKind) -> Duration {
        self.delay_at(kind, Instant::now())
    }

    /// `base × fatigue × (1 + level/100 × 0.5) ± variance`, never negative
    pub fn delay_at(&mut self, kind: ActionKind, now: Instant) -> Duration {
        let base = self.params.base_delay_ms(kind);
        let fatigue = self
            .timing
            .advance(now, self.params.idle_fatigue_threshold);
        let scale = 1.0 + self.params.human_factor() * LEVEL_DELAY_SCALE;
        let variance = self.symmetric(self.params.reaction_variance_ms as f64);

        let delay_ms = (base * fatigue * scale + variance).max(0.0);
        trace!(
            "[HUMANIZE] {} delay {:.1} ms (fatigue {:.2})",
            kind,
            delay_ms,
            fatigue
        );
        Duration::from_nanos((delay_ms * 1_000_000.0).round() as u64)
    }

    /// One intermediate waypoint from `start` toward `target`
    pub fn movement_waypoint(&mut self, start: Point2, target: Point2) -> Point2 {
        let delta = target - start;
        let distance = delta.norm();
        let spread = CURVE_SPREAD * self.params.human_factor() * self.params.speed_factor();

        let wobble1 = Point2::new(self.symmetric(spread), self.symmetric(spread))
            * (distance * FIRST_CONTROL_WOBBLE);
        let wobble2 = Point2::new(self.symmetric(spread), self.symmetric(spread))
            * (distance * SECOND_CONTROL_WOBBLE);

        let control1 = start + delta * FIRST_CONTROL_AT + wobble1;
        let control2 = start + delta * SECOND_CONTROL_AT + wobble2;

        cubic_bezier(start, control1, control2, target, WAYPOINT_T)
    }

    /// `point` plus up to ±1 px × humanization level on each axis
    pub fn jitter(&mut self, point: Point2) -> Point2 {
        let bound = JITTER_PX * self.params.human_factor();
        Point2::new(
            point.x + self.symmetric(bound),
            point.y + self.symmetric(bound),
        )
    }

    /// Offer a sample to the learned corpus; see [`PatternCorpus::ingest`]
    pub fn ingest(&mut self, sample: MovementSample) -> bool {
        self.corpus.ingest(sample)
    }

    /// Ingest every pattern of a document, returning how many were accepted
    pub fn ingest_corpus(&mut self, document: CorpusDocument) -> usize {
        let offered = document.patterns.len();
        let accepted = document
            .into_samples()
            .map(|sample| self.corpus.ingest(sample))
            .filter(|accepted| *accepted)
            .count();
        debug!(
            "[HUMANIZE] Corpus ingest accepted {}/{} patterns ({} retained)",
            accepted,
            offered,
            self.corpus.len()
        );
        accepted
    }

    pub fn corpus(&self) -> &PatternCorpus {
        &self.corpus
    }

    /// See [`corpus::naturalness_score`]
    pub fn naturalness_score(sample: &MovementSample) -> f64 {
        corpus::naturalness_score(&sample.waypoints, &sample.timings_ms)
    }

    fn symmetric(&mut self, bound: f64) -> f64 {
        if bound > 0.0 && bound.is_finite() {
            self.rng.gen_range(-bound..=bound)
        } else {
            0.0
        }
    }
}
