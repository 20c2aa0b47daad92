// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pattern corpus inspector.
//!
//! Loads a saved movement-pattern document, rescores every sample, and reports
//! which samples the in-memory corpus would retain. With `--write <path>` the
//! retained set is saved as a fresh document.

use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use praxis::humanization::{
    CorpusDocument, MovementSample, PatternCorpus, ACCEPTANCE_THRESHOLD, CORPUS_CAPACITY,
};
use praxis::observability::{init_console_logging, parse_debug_flags, LoggingConfig};
use serde_json::json;

struct Args {
    input: PathBuf,
    output: Option<PathBuf>,
    json: bool,
}

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: corpus_inspect <corpus.json> [--write <path>] [--json] [--debug-<crate>]\n\n\
         Rescores each pattern and reports how many pass the acceptance threshold ({ACCEPTANCE_THRESHOLD})\n\
         and fit in the corpus (capacity {CORPUS_CAPACITY}).\n"
    );
    process::exit(2);
}

fn parse_args() -> Args {
    let mut input = None;
    let mut output = None;
    let mut json = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--write" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                output = Some(PathBuf::from(v));
            }
            "--json" => json = true,
            "-h" | "--help" => usage_and_exit(),
            // Consumed by parse_debug_flags
            other if other.starts_with("--debug") => {}
            other if input.is_none() && !other.starts_with('-') => {
                input = Some(PathBuf::from(other));
            }
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit();
            }
        }
    }

    Args {
        input: input.unwrap_or_else(|| usage_and_exit()),
        output,
        json,
    }
}

struct Report {
    declared: usize,
    loaded: usize,
    rejected: usize,
    retained: usize,
    score_range: Option<(f64, f64)>,
}

fn inspect(document: CorpusDocument) -> (Report, PatternCorpus) {
    let declared = document.pattern_count;
    let mut corpus = PatternCorpus::new();
    let mut loaded = 0;
    let mut rejected = 0;

    for mut sample in document.into_samples() {
        loaded += 1;
        rescore(&mut sample);
        if !corpus.ingest(sample) {
            rejected += 1;
        }
    }

    let report = Report {
        declared,
        loaded,
        rejected,
        retained: corpus.len(),
        score_range: corpus.score_range(),
    };
    (report, corpus)
}

// Stored scores are not trusted
fn rescore(sample: &mut MovementSample) {
    let stored = sample.naturalness_score;
    let fresh = sample.rescore();
    if (stored - fresh).abs() > 1e-6 {
        tracing::debug!("[CORPUS] Rescored sample {stored:.3} -> {fresh:.3}");
    }
}

fn main() -> Result<()> {
    let args = parse_args();
    init_console_logging(&parse_debug_flags(), &LoggingConfig::with_level("warn"))
        .context("failed to initialise logging")?;

    let document = CorpusDocument::load(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    let (report, corpus) = inspect(document);

    if args.json {
        let range = report.score_range.map(|(lo, hi)| json!({ "min": lo, "max": hi }));
        let out = json!({
            "input": args.input.display().to_string(),
            "declared": report.declared,
            "loaded": report.loaded,
            "rejected": report.rejected,
            "retained": report.retained,
            "score_range": range,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Corpus: {}", args.input.display());
        println!("  declared:  {}", report.declared);
        println!("  loaded:    {}", report.loaded);
        println!("  rejected:  {} (score <= {ACCEPTANCE_THRESHOLD})", report.rejected);
        println!("  retained:  {} / {CORPUS_CAPACITY}", report.retained);
        match report.score_range {
            Some((lo, hi)) => println!("  scores:    {lo:.3} .. {hi:.3}"),
            None => println!("  scores:    -"),
        }
    }

    if let Some(path) = args.output {
        CorpusDocument::from_samples(corpus.samples())
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(())
}
