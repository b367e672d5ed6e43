use std::path::{Path, PathBuf};
use std::time::Duration;

/// Row counters for one dataset file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStats {
    pub source: &'static str,
    pub path: PathBuf,
    pub rows: u64,
    pub candidates: u64,
    /// Rows that failed required-field checks
    pub skipped: u64,
}

impl SourceStats {
    pub fn new(source: &'static str, path: &Path) -> Self {
        Self {
            source,
            path: path.to_path_buf(),
            rows: 0,
            candidates: 0,
            skipped: 0,
        }
    }
}

/// Outcome of a `build` run
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub sources: Vec<SourceStats>,
    pub missing: Vec<String>,
    pub seen: u64,
    pub valid: u64,
    pub unique: u64,
    /// `None` on a dry run
    pub written: Option<u64>,
    pub output: PathBuf,
    pub updated_at: String,
    pub elapsed: Duration,
}

impl BuildSummary {
    pub fn rows(&self) -> u64 {
        self.sources.iter().map(|s| s.rows).sum()
    }

    pub fn skipped(&self) -> u64 {
        self.sources.iter().map(|s| s.skipped).sum()
    }

    pub fn print(&self) {
        println!();
        println!("=== Summary ===");
        for stats in &self.sources {
            println!(
                "{:<20} rows={} candidates={} skipped={}  ({})",
                stats.source,
                stats.rows,
                stats.candidates,
                stats.skipped,
                stats.path.display()
            );
        }
        for missing in &self.missing {
            println!("{:<20} not found", missing);
        }
        println!();
        println!("Rows read:          {}", self.rows());
        println!("Rows skipped:       {}", self.skipped());
        println!("Candidates seen:    {}", self.seen);
        println!("Candidates valid:   {}", self.valid);
        println!("Unique barcodes:    {}", self.unique);
        match self.written {
            Some(written) => println!("Rows written:       {} -> {}", written, self.output.display()),
            None => println!("Rows written:       0 (dry run)"),
        }
        println!("Updated at:         {}", self.updated_at);
        println!("Total time:         {:.2}s", self.elapsed.as_secs_f64());
    }
}
