//! Dataset containers and discovery of the inputs present in the raw directory.

use crate::config::{
    CATALOG_ARCHIVE, CATALOG_MEMBER, CATALOG_RANK, CATALOG_SOURCE, OPEN_FACTS_DATASETS,
    OPEN_FACTS_RANK, OPEN_FOOD_FACTS_DATASET, READ_BUFFER_SIZE, REFERENCE_RANK, REFERENCE_SOURCE,
};
use crate::lexicon::Lexicon;
use crate::models::Candidate;
use crate::parser::{catalog_candidates, open_facts_candidates, reference_candidates, ParsedRow};
use crate::stats::SourceStats;
use anyhow::{bail, Context, Result};
use flate2::read::MultiGzDecoder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

static REFERENCE_ARCHIVE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*uhtt.*\.zip$").unwrap());

static REFERENCE_MEMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|/)[^/]*uhtt_barcode_ref_[^/]*\.csv$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Zip of positional tab-delimited files
    Reference,
    /// Zip holding a single semicolon-delimited `barcodes.csv`
    Catalog,
    /// Gzip-compressed tab-delimited export with named columns
    OpenFacts,
}

/// One input file and how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub source: &'static str,
    pub rank: u32,
    pub path: PathBuf,
    pub kind: SourceKind,
}

impl Dataset {
    /// Pushes every candidate in the dataset to `sink`, in file order.
    pub fn stream<F>(&self, lexicon: &Lexicon, mut sink: F) -> Result<SourceStats>
    where
        F: FnMut(Candidate),
    {
        let mut stats = SourceStats::new(self.source, &self.path);
        match self.kind {
            SourceKind::Reference => self.stream_reference(lexicon, &mut stats, &mut sink)?,
            SourceKind::Catalog => self.stream_catalog(lexicon, &mut stats, &mut sink)?,
            SourceKind::OpenFacts => {
                let file = File::open(&self.path)
                    .with_context(|| format!("Failed to open dataset: {:?}", self.path))?;
                let reader =
                    BufReader::with_capacity(READ_BUFFER_SIZE, MultiGzDecoder::new(file));
                let rows = open_facts_candidates(reader, self.source, self.rank, lexicon)
                    .with_context(|| format!("Failed to read dataset: {:?}", self.path))?;
                drain(rows, &mut stats, &mut sink)
                    .with_context(|| format!("Failed to read dataset: {:?}", self.path))?;
            }
        }
        Ok(stats)
    }

    fn stream_reference<F: FnMut(Candidate)>(
        &self,
        lexicon: &Lexicon,
        stats: &mut SourceStats,
        sink: &mut F,
    ) -> Result<()> {
        let mut archive = open_archive(&self.path)?;
        let mut members: Vec<String> = archive
            .file_names()
            .filter(|name| REFERENCE_MEMBER_REGEX.is_match(name))
            .map(String::from)
            .collect();
        members.sort();

        if members.is_empty() {
            warn!(path = ?self.path, "No reference catalog files inside archive");
        }

        for member in &members {
            debug!(member = member.as_str(), "Reading archive member");
            let entry = archive
                .by_name(member)
                .with_context(|| format!("Failed to open {} in {:?}", member, self.path))?;
            let reader = BufReader::with_capacity(READ_BUFFER_SIZE, entry);
            drain(
                reference_candidates(reader, self.source, self.rank, lexicon),
                stats,
                sink,
            )
            .with_context(|| format!("Failed to read {} in {:?}", member, self.path))?;
        }
        Ok(())
    }

    fn stream_catalog<F: FnMut(Candidate)>(
        &self,
        lexicon: &Lexicon,
        stats: &mut SourceStats,
        sink: &mut F,
    ) -> Result<()> {
        let mut archive = open_archive(&self.path)?;
        let member = archive
            .file_names()
            .find(|name| base_name(name).to_lowercase() == CATALOG_MEMBER)
            .map(String::from);
        let Some(member) = member else {
            bail!("{} not found in {:?}", CATALOG_MEMBER, self.path);
        };

        let entry = archive
            .by_name(&member)
            .with_context(|| format!("Failed to open {} in {:?}", member, self.path))?;
        let reader = BufReader::with_capacity(READ_BUFFER_SIZE, entry);
        let rows = catalog_candidates(reader, self.source, self.rank, lexicon)
            .with_context(|| format!("Failed to read {} in {:?}", member, self.path))?;
        drain(rows, stats, sink)
            .with_context(|| format!("Failed to read {} in {:?}", member, self.path))
    }
}

fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("Failed to open archive: {:?}", path))?;
    ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("Failed to read zip archive: {:?}", path))
}

fn drain<I, F>(rows: I, stats: &mut SourceStats, sink: &mut F) -> Result<()>
where
    I: Iterator<Item = ParsedRow>,
    F: FnMut(Candidate),
{
    for row in rows {
        stats.rows += 1;
        match row? {
            Some(candidate) => {
                stats.candidates += 1;
                sink(candidate);
            }
            None => stats.skipped += 1,
        }
    }
    Ok(())
}

fn base_name(member: &str) -> &str {
    member.rsplit('/').next().unwrap_or(member)
}

/// Datasets found in the raw directory, in processing order.
#[derive(Debug, Default)]
pub struct SourcePlan {
    pub datasets: Vec<Dataset>,
    /// Optional inputs that were not present
    pub missing: Vec<String>,
}

/// Resolves the inputs under `raw_dir` in fixed priority order: reference archives,
/// secondary catalog, then the open datasets.
pub fn discover(raw_dir: &Path, include_off_food: bool) -> Result<SourcePlan> {
    let mut plan = SourcePlan::default();

    let archives = reference_archives(raw_dir)?;
    if archives.is_empty() {
        warn!(dir = ?raw_dir, "Reference catalog archive not found (*uhtt*.zip)");
        plan.missing.push("*uhtt*.zip".to_string());
    }
    for path in archives {
        plan.datasets.push(Dataset {
            source: REFERENCE_SOURCE,
            rank: REFERENCE_RANK,
            path,
            kind: SourceKind::Reference,
        });
    }

    let mut optional = vec![(CATALOG_ARCHIVE, CATALOG_SOURCE, CATALOG_RANK, SourceKind::Catalog)];
    optional.extend(
        OPEN_FACTS_DATASETS
            .iter()
            .map(|&(file, source)| (file, source, OPEN_FACTS_RANK, SourceKind::OpenFacts)),
    );
    if include_off_food {
        let (file, source) = OPEN_FOOD_FACTS_DATASET;
        optional.push((file, source, OPEN_FACTS_RANK, SourceKind::OpenFacts));
    }

    for (file, source, rank, kind) in optional {
        let path = raw_dir.join(file);
        if !path.is_file() {
            warn!(source, file, "Source file not found, skipping");
            plan.missing.push(file.to_string());
            continue;
        }
        plan.datasets.push(Dataset {
            source,
            rank,
            path,
            kind,
        });
    }

    info!(
        datasets = plan.datasets.len(),
        missing = plan.missing.len(),
        "Sources resolved"
    );
    Ok(plan)
}

fn reference_archives(raw_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(raw_dir)
        .with_context(|| format!("Failed to list raw directory: {:?}", raw_dir))?;

    let mut archives = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list raw directory: {:?}", raw_dir))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| REFERENCE_ARCHIVE_REGEX.is_match(name));
        if matches && path.is_file() {
            archives.push(path);
        }
    }
    archives.sort();
    Ok(archives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, members: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, content) in members {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn write_gz(path: &Path, content: &str) {
        let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::fast());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    fn collect(dataset: &Dataset) -> Result<(Vec<Candidate>, SourceStats)> {
        let lexicon = Lexicon::default();
        let mut out = Vec::new();
        let stats = dataset.stream(&lexicon, |c| out.push(c))?;
        Ok((out, stats))
    }

    #[test]
    fn member_patterns() {
        assert!(REFERENCE_MEMBER_REGEX.is_match("Ref-2023/DATA/uhtt_barcode_ref_0001.csv"));
        assert!(REFERENCE_MEMBER_REGEX.is_match("UHTT_BARCODE_REF_0002.CSV"));
        assert!(!REFERENCE_MEMBER_REGEX.is_match("uhtt_barcode_ref_0001/readme.txt"));
        assert!(!REFERENCE_MEMBER_REGEX.is_match("DATA/goods.csv"));
        assert!(REFERENCE_ARCHIVE_REGEX.is_match("uhtt-reference-20230913.zip"));
        assert!(!REFERENCE_ARCHIVE_REGEX.is_match("uhtt-reference.tar.gz"));
        assert_eq!(base_name("a/b/Barcodes.csv"), "Barcodes.csv");
        assert_eq!(base_name("barcodes.csv"), "barcodes.csv");
    }

    #[test]
    fn reference_members_read_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uhtt-ref.zip");
        write_zip(
            &path,
            &[
                ("DATA/uhtt_barcode_ref_0002.csv", "2\t222\tВторой\t1\tc\t1\tb\n"),
                ("DATA/readme.txt", "ignored"),
                (
                    "DATA/uhtt_barcode_ref_0001.csv",
                    "id\tcode\tname\t\t\t\t\n1\t111\tПервый\t1\tc\t1\tb\n",
                ),
            ],
        );
        let dataset = Dataset {
            source: REFERENCE_SOURCE,
            rank: REFERENCE_RANK,
            path,
            kind: SourceKind::Reference,
        };

        let (candidates, stats) = collect(&dataset).unwrap();
        let barcodes: Vec<_> = candidates.iter().map(|c| c.barcode.as_str()).collect();
        assert_eq!(barcodes, vec!["111", "222"]);
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.candidates, 2);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn catalog_member_matched_case_insensitively() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CATALOG_ARCHIVE);
        write_zip(
            &path,
            &[("export/Barcodes.CSV", "Barcode;Name\n4601576009686;Майонез\n")],
        );
        let dataset = Dataset {
            source: CATALOG_SOURCE,
            rank: CATALOG_RANK,
            path,
            kind: SourceKind::Catalog,
        };

        let (candidates, _) = collect(&dataset).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].source, "catalog");
    }

    #[test]
    fn catalog_without_member_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CATALOG_ARCHIVE);
        write_zip(&path, &[("other.csv", "Barcode;Name\n")]);
        let dataset = Dataset {
            source: CATALOG_SOURCE,
            rank: CATALOG_RANK,
            path,
            kind: SourceKind::Catalog,
        };

        let err = collect(&dataset).unwrap_err();
        assert!(format!("{:#}", err).contains("barcodes.csv not found"));
    }

    #[test]
    fn open_facts_reads_gzip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("openbeautyfacts-products.csv.gz");
        write_gz(
            &path,
            "code\tproduct_name\tbrands\n4600000000001\tКрем для рук\tBrand A,Brand B\n",
        );
        let dataset = Dataset {
            source: "open_beauty_facts",
            rank: OPEN_FACTS_RANK,
            path,
            kind: SourceKind::OpenFacts,
        };

        let (candidates, stats) = collect(&dataset).unwrap();
        assert_eq!(candidates[0].name, "Крем для рук");
        assert_eq!(candidates[0].brand.as_deref(), Some("Brand A"));
        assert_eq!(stats.candidates, 1);
    }

    #[test]
    fn corrupt_gzip_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("openbeautyfacts-products.csv.gz");
        fs::write(&path, b"definitely not gzip").unwrap();
        let dataset = Dataset {
            source: "open_beauty_facts",
            rank: OPEN_FACTS_RANK,
            path,
            kind: SourceKind::OpenFacts,
        };
        assert!(collect(&dataset).is_err());
    }

    #[test]
    fn discover_orders_sources_by_priority() {
        let dir = TempDir::new().unwrap();
        write_zip(&dir.path().join("uhtt-b.zip"), &[]);
        write_zip(&dir.path().join("uhtt-a.zip"), &[]);
        write_zip(&dir.path().join(CATALOG_ARCHIVE), &[]);
        for (file, _) in OPEN_FACTS_DATASETS {
            write_gz(&dir.path().join(file), "code\n");
        }
        write_gz(&dir.path().join(OPEN_FOOD_FACTS_DATASET.0), "code\n");

        let plan = discover(dir.path(), false).unwrap();
        let sources: Vec<_> = plan.datasets.iter().map(|d| d.source).collect();
        assert_eq!(
            sources,
            vec![
                "uhtt",
                "uhtt",
                "catalog",
                "open_beauty_facts",
                "open_pet_food_facts",
                "open_products_facts"
            ]
        );
        assert!(plan.datasets[0].path.ends_with("uhtt-a.zip"));
        assert!(plan.missing.is_empty());

        let plan = discover(dir.path(), true).unwrap();
        assert_eq!(plan.datasets.last().unwrap().source, "open_food_facts");
    }

    #[test]
    fn discover_reports_missing_optional_inputs() {
        let dir = TempDir::new().unwrap();
        let plan = discover(dir.path(), false).unwrap();
        assert!(plan.datasets.is_empty());
        assert_eq!(plan.missing.len(), 5);
        assert!(plan.missing.contains(&CATALOG_ARCHIVE.to_string()));
    }

    #[test]
    fn discover_fails_for_missing_directory() {
        assert!(discover(Path::new("/nonexistent/raw"), false).is_err());
    }
}
