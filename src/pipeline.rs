use crate::aggregate::CandidateAggregator;
use crate::config::{FALLBACK_CATEGORY, PROGRESS_INTERVAL};
use crate::lexicon::Lexicon;
use crate::sources;
use crate::stats::BuildSummary;
use crate::store;
use anyhow::{bail, Result};
use chrono::{SecondsFormat, Utc};
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

pub struct BuildConfig {
    pub raw_dir: PathBuf,
    pub output: PathBuf,
    pub include_off_food: bool,
    pub dry_run: bool,
    pub lexicon: Lexicon,
    pub fallback_category: String,
}

impl BuildConfig {
    pub fn new(raw_dir: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            output: output.into(),
            include_off_food: false,
            dry_run: false,
            lexicon: Lexicon::default(),
            fallback_category: FALLBACK_CATEGORY.to_string(),
        }
    }
}

/// Streams every dataset into one aggregator, in priority order, and writes the
/// winners to the output index.
///
/// Datasets are processed one after another; the first fatal error aborts the run
/// before anything is written.
pub fn run_build(config: &BuildConfig) -> Result<BuildSummary> {
    let start = Instant::now();
    if !config.raw_dir.is_dir() {
        bail!("Raw directory does not exist: {:?}", config.raw_dir);
    }

    let plan = sources::discover(&config.raw_dir, config.include_off_food)?;
    let mut aggregator = CandidateAggregator::new(&config.lexicon);
    let mut source_stats = Vec::with_capacity(plan.datasets.len());

    let pb = ProgressBar::new_spinner();
    for dataset in &plan.datasets {
        info!(source = dataset.source, path = ?dataset.path, "Parsing dataset");
        pb.set_message(format!("{} ({})", dataset.source, dataset.path.display()));

        let stats = dataset.stream(&config.lexicon, |candidate| {
            aggregator.offer(candidate);
            if aggregator.total_seen() % PROGRESS_INTERVAL == 0 {
                pb.tick();
            }
        })?;

        info!(
            source = stats.source,
            rows = stats.rows,
            candidates = stats.candidates,
            skipped = stats.skipped,
            "Dataset complete"
        );
        source_stats.push(stats);
    }
    pb.finish_and_clear();

    let updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
    let seen = aggregator.total_seen();
    let valid = aggregator.total_valid();
    let unique = aggregator.unique() as u64;
    let rows = aggregator.into_rows(&config.fallback_category, &updated_at);

    let written = if config.dry_run {
        info!("Dry run, skipping index write");
        None
    } else {
        Some(store::write_index(&config.output, &rows)?)
    };

    info!(seen, valid, unique, output = ?config.output, "Built index");

    Ok(BuildSummary {
        sources: source_stats,
        missing: plan.missing,
        seen,
        valid,
        unique,
        written,
        output: config.output.clone(),
        updated_at,
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_raw_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = BuildConfig::new(dir.path().join("absent"), dir.path().join("out.sqlite"));
        let err = run_build(&config).unwrap_err();
        assert!(err.to_string().contains("Raw directory does not exist"));
    }

    #[test]
    fn empty_raw_dir_writes_empty_index() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("raw");
        std::fs::create_dir(&raw).unwrap();
        let output = dir.path().join("index").join("out.sqlite");

        let summary = run_build(&BuildConfig::new(&raw, &output)).unwrap();
        assert_eq!(summary.seen, 0);
        assert_eq!(summary.written, Some(0));
        assert_eq!(summary.missing.len(), 5);
        assert!(summary.updated_at.ends_with('Z'));
        assert!(output.exists());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.sqlite");
        let mut config = BuildConfig::new(dir.path(), &output);
        config.dry_run = true;

        let summary = run_build(&config).unwrap();
        assert_eq!(summary.written, None);
        assert!(!output.exists());
    }
}
