// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Movement Pattern Corpus
//!
//! Naturalness scoring, the bounded best-first sample store, and the
//! persisted pattern document produced by offline recording sessions.
//!
//! Document layout:
//! ```json
//! {
//!   "patterns": [
//!     { "movements": [{"x": 1.0, "y": 2.0}], "timings": [16, 17], "naturalness_score": 0.82 }
//!   ],
//!   "pattern_count": 1,
//!   "extraction_date": "2025-01-01T12:00:00Z"
//! }
//! ```

use crate::error::Result;
use crate::motion::Point2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Samples at or below this score are rejected
pub const ACCEPTANCE_THRESHOLD: f64 = 0.7;
pub const CORPUS_CAPACITY: usize = 100;

const SMOOTHNESS_WEIGHT: f64 = 0.7;
const TIMING_WEIGHT: f64 = 0.3;
const JERK_NORMALIZER: f64 = 100.0;
const TIMING_STD_NORMALIZER: f64 = 50.0;

/// One recorded or synthesized cursor movement
#[derive(Debug, Clone, PartialEq)]
pub struct MovementSample {
    pub waypoints: Vec<Point2>,
    pub timings_ms: Vec<u64>,
    pub naturalness_score: f64,
}

impl MovementSample {
    /// Sample whose score is computed from its own waypoints and timings
    pub fn scored(waypoints: Vec<Point2>, timings_ms: Vec<u64>) -> Self {
        let naturalness_score = naturalness_score(&waypoints, &timings_ms);
        Self {
            waypoints,
            timings_ms,
            naturalness_score,
        }
    }

    /// Recompute the score, discarding the stored one
    pub fn rescore(&mut self) -> f64 {
        self.naturalness_score = naturalness_score(&self.waypoints, &self.timings_ms);
        self.naturalness_score
    }
}

/// `1 / (1 + Σ|second difference| / 100)`; straight evenly spaced paths score 1.0
pub fn smoothness(waypoints: &[Point2]) -> f64 {
    let jerk: f64 = waypoints
        .windows(3)
        .map(|w| ((w[2] - w[1]) - (w[1] - w[0])).norm())
        .sum();
    1.0 / (1.0 + jerk / JERK_NORMALIZER)
}

/// Population standard deviation of timings over 50 ms, capped at 1.0
pub fn timing_variance(timings_ms: &[u64]) -> f64 {
    if timings_ms.len() < 2 {
        return 0.0;
    }
    let n = timings_ms.len() as f64;
    let mean = timings_ms.iter().map(|&t| t as f64).sum::<f64>() / n;
    let variance = timings_ms
        .iter()
        .map(|&t| {
            let d = t as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    (variance.sqrt() / TIMING_STD_NORMALIZER).min(1.0)
}

/// Weighted naturalness; fewer than two waypoints scores 0
pub fn naturalness_score(waypoints: &[Point2], timings_ms: &[u64]) -> f64 {
    if waypoints.len() < 2 {
        return 0.0;
    }
    SMOOTHNESS_WEIGHT * smoothness(waypoints) + TIMING_WEIGHT * timing_variance(timings_ms)
}

/// Highest-scoring samples, at most `capacity`
#[derive(Debug, Clone)]
pub struct PatternCorpus {
    samples: Vec<MovementSample>,
    capacity: usize,
}

impl PatternCorpus {
    pub fn new() -> Self {
        Self::with_capacity(CORPUS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Keep `sample` if its score exceeds the acceptance threshold
    ///
    /// Going over capacity sorts by score descending and truncates. Returns
    /// whether the sample was accepted (it may still be truncated away).
    pub fn ingest(&mut self, sample: MovementSample) -> bool {
        if sample.naturalness_score.is_nan() || sample.naturalness_score <= ACCEPTANCE_THRESHOLD {
            return false;
        }
        self.samples.push(sample);
        if self.samples.len() > self.capacity {
            self.samples
                .sort_by(|a, b| b.naturalness_score.total_cmp(&a.naturalness_score));
            self.samples.truncate(self.capacity);
        }
        true
    }

    pub fn samples(&self) -> &[MovementSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// (lowest, highest) retained score
    pub fn score_range(&self) -> Option<(f64, f64)> {
        self.samples.iter().map(|s| s.naturalness_score).fold(None, |acc, s| match acc {
            None => Some((s, s)),
            Some((lo, hi)) => Some((lo.min(s), hi.max(s))),
        })
    }
}

impl Default for PatternCorpus {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialized pattern entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    pub movements: Vec<Point2>,
    pub timings: Vec<u64>,
    pub naturalness_score: f64,
}

impl From<PatternRecord> for MovementSample {
    fn from(record: PatternRecord) -> Self {
        MovementSample {
            waypoints: record.movements,
            timings_ms: record.timings,
            naturalness_score: record.naturalness_score,
        }
    }
}

impl From<&MovementSample> for PatternRecord {
    fn from(sample: &MovementSample) -> Self {
        PatternRecord {
            movements: sample.waypoints.clone(),
            timings: sample.timings_ms.clone(),
            naturalness_score: sample.naturalness_score,
        }
    }
}

/// On-disk pattern document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusDocument {
    pub patterns: Vec<PatternRecord>,
    pub pattern_count: usize,
    pub extraction_date: DateTime<Utc>,
}

impl CorpusDocument {
    /// Document holding `samples`, stamped with the current time
    pub fn from_samples<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = &'a MovementSample>,
    {
        let patterns: Vec<PatternRecord> = samples.into_iter().map(PatternRecord::from).collect();
        Self {
            pattern_count: patterns.len(),
            patterns,
            extraction_date: Utc::now(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let document: CorpusDocument = serde_json::from_str(&content)?;
        if document.pattern_count != document.patterns.len() {
            warn!(
                "[CORPUS] {} declares {} patterns but holds {}",
                path.display(),
                document.pattern_count,
                document.patterns.len()
            );
        }
        debug!(
            "[CORPUS] Loaded {} patterns from {}",
            document.patterns.len(),
            path.display()
        );
        Ok(document)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("[CORPUS] Saved {} patterns to {}", self.patterns.len(), path.display());
        Ok(())
    }

    pub fn into_samples(self) -> impl Iterator<Item = MovementSample> {
        self.patterns.into_iter().map(MovementSample::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn line(n: usize, step: f64) -> Vec<Point2> {
        (0..n).map(|i| Point2::new(i as f64 * step, 0.0)).collect()
    }

    fn sample_with_score(score: f64) -> MovementSample {
        MovementSample {
            waypoints: line(3, 1.0),
            timings_ms: vec![10, 10],
            naturalness_score: score,
        }
    }

    #[test]
    fn test_even_line_is_perfectly_smooth() {
        assert_eq!(smoothness(&line(10, 5.0)), 1.0);
    }

    #[test]
    fn test_jumpy_path_scores_lower() {
        let timings = vec![16, 18, 15, 20, 17];
        let smooth = line(6, 10.0);
        let jumpy = vec![
            Point2::new(0.0, 0.0),
            Point2::new(80.0, -60.0),
            Point2::new(5.0, 90.0),
            Point2::new(120.0, 10.0),
            Point2::new(-40.0, -70.0),
            Point2::new(50.0, 50.0),
        ];
        assert!(smoothness(&smooth) > smoothness(&jumpy));
        assert!(naturalness_score(&smooth, &timings) > naturalness_score(&jumpy, &timings));
    }

    #[test]
    fn test_timing_variance_normalization() {
        assert_eq!(timing_variance(&[]), 0.0);
        assert_eq!(timing_variance(&[40]), 0.0);
        // population std of [0, 50] is 25
        assert_eq!(timing_variance(&[0, 50]), 0.5);
        assert_eq!(timing_variance(&[0, 1000]), 1.0);
    }

    #[test]
    fn test_short_path_scores_zero() {
        assert_eq!(naturalness_score(&[Point2::new(1.0, 1.0)], &[10, 90]), 0.0);
        assert_eq!(naturalness_score(&[], &[]), 0.0);
    }

    #[test]
    fn test_score_weights() {
        // smoothness 1.0, timing std 25 -> 0.5
        let score = naturalness_score(&line(4, 2.0), &[0, 50]);
        assert!((score - (0.7 + 0.15)).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut corpus = PatternCorpus::new();
        assert!(!corpus.ingest(sample_with_score(0.7)));
        assert!(!corpus.ingest(sample_with_score(f64::NAN)));
        assert!(corpus.ingest(sample_with_score(0.7001)));
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn test_overflow_keeps_top_scores() {
        let mut corpus = PatternCorpus::new();
        let scores: Vec<f64> = (0..105).map(|i| 0.71 + i as f64 * 0.002).collect();
        // Insert in a scrambled order
        for i in 0..105 {
            corpus.ingest(sample_with_score(scores[(i * 37) % 105]));
        }

        assert_eq!(corpus.len(), CORPUS_CAPACITY);
        let mut kept: Vec<f64> = corpus.samples().iter().map(|s| s.naturalness_score).collect();
        kept.sort_by(|a, b| b.total_cmp(a));
        let mut expected = scores.clone();
        expected.sort_by(|a, b| b.total_cmp(a));
        expected.truncate(CORPUS_CAPACITY);
        assert_eq!(kept, expected);
    }

    #[test]
    fn test_document_round_trip_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("patterns.json");
        let samples = vec![
            MovementSample::scored(line(5, 3.0), vec![12, 40, 25, 60]),
            sample_with_score(0.9),
        ];

        CorpusDocument::from_samples(&samples).save(&path).unwrap();
        let loaded = CorpusDocument::load(&path).unwrap();

        assert_eq!(loaded.pattern_count, 2);
        let restored: Vec<MovementSample> = loaded.into_samples().collect();
        assert_eq!(restored, samples);
    }

    #[test]
    fn test_load_reads_external_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("external.json");
        fs::write(
            &path,
            r#"{
                "patterns": [
                    {"movements": [{"x": 0, "y": 0}, {"x": 1.5, "y": 2}], "timings": [16, 33], "naturalness_score": 0.75}
                ],
                "pattern_count": 1,
                "extraction_date": "2024-06-01T08:30:00Z"
            }"#,
        )
        .unwrap();

        let doc = CorpusDocument::load(&path).unwrap();
        assert_eq!(doc.patterns[0].movements[1], Point2::new(1.5, 2.0));
        assert_eq!(doc.patterns[0].timings, vec![16, 33]);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            CorpusDocument::load(&path),
            Err(crate::HumanizationError::Format(_))
        ));
    }
}
