//! Row-level parsers for the three dataset shapes.
//!
//! Each parser reads delimited text from any [`Read`] and lazily yields one item per
//! row: `Ok(Some(candidate))` for a usable row, `Ok(None)` for a row skipped on
//! required-field checks, and `Err` when the underlying stream fails. Containers
//! (zip members, gzip files) are opened by [`crate::sources`].

use crate::config::REFERENCE_MIN_COLUMNS;
use crate::lexicon::Lexicon;
use crate::models::Candidate;
use crate::normalize::{first_token, normalize_barcode, normalize_optional, normalize_text};
use crate::quality::quality_score;
use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder};
use std::borrow::Cow;
use std::io::Read;

pub type ParsedRow = Result<Option<Candidate>>;

/// Tab-delimited reference catalog rows addressed by position.
///
/// Columns: 1 barcode, 2 name, 4 category, 6 brand. A row whose first column is
/// `id` is a header repeated at the top of every file and is skipped.
pub fn reference_candidates<'a, R: Read + 'a>(
    reader: R,
    source: &'static str,
    rank: u32,
    lexicon: &'a Lexicon,
) -> impl Iterator<Item = ParsedRow> + 'a {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
        .into_byte_records()
        .map(move |record| -> ParsedRow {
            let record = record.context("Failed to read reference catalog row")?;
            Ok(reference_row(&record, source, rank, lexicon))
        })
}

fn reference_row(
    record: &ByteRecord,
    source: &'static str,
    rank: u32,
    lexicon: &Lexicon,
) -> Option<Candidate> {
    if record.len() < REFERENCE_MIN_COLUMNS {
        return None;
    }
    if decode_field(&record[0]).trim().eq_ignore_ascii_case("id") {
        return None;
    }

    let barcode = normalize_barcode(&decode_field(&record[1]));
    let name = normalize_text(&decode_field(&record[2]));
    let category = normalize_optional(Some(&decode_field(&record[4])));
    let brand = normalize_optional(Some(&decode_field(&record[6])));

    build_candidate(barcode, name, brand, category, source, rank, lexicon)
}

/// Semicolon-delimited secondary catalog with a `Barcode;Name;Vendor;Category` header
/// (any column order, extra columns ignored).
pub fn catalog_candidates<'a, R: Read + 'a>(
    reader: R,
    source: &'static str,
    rank: u32,
    lexicon: &'a Lexicon,
) -> Result<impl Iterator<Item = ParsedRow> + 'a> {
    let mut csv = ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(reader);
    let headers = Headers::read(&mut csv).context("Failed to read secondary catalog header")?;
    let barcode_col = headers.position("Barcode");
    let name_col = headers.position("Name");
    let brand_col = headers.position("Vendor");
    let category_col = headers.position("Category");

    Ok(csv.into_byte_records().map(move |record| -> ParsedRow {
        let record = record.context("Failed to read secondary catalog row")?;
        let barcode = normalize_barcode(&field(&record, barcode_col));
        let name = normalize_text(&field(&record, name_col));
        let brand = normalize_optional(Some(&field(&record, brand_col)));
        let category = normalize_optional(Some(&field(&record, category_col)));

        Ok(build_candidate(
            barcode, name, brand, category, source, rank, lexicon,
        ))
    }))
}

/// Tab-delimited open dataset export with a header row.
///
/// The name is the first non-empty of `product_name`, `generic_name` and
/// `abbreviated_product_name`. `brands` and `categories` are comma-separated lists;
/// only their first entry is kept.
pub fn open_facts_candidates<'a, R: Read + 'a>(
    reader: R,
    source: &'static str,
    rank: u32,
    lexicon: &'a Lexicon,
) -> Result<impl Iterator<Item = ParsedRow> + 'a> {
    let mut csv = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader);
    let headers = Headers::read(&mut csv)
        .with_context(|| format!("Failed to read {} header", source))?;
    let code_col = headers.position("code");
    let name_cols = [
        headers.position("product_name"),
        headers.position("generic_name"),
        headers.position("abbreviated_product_name"),
    ];
    let brands_col = headers.position("brands");
    let categories_col = headers.position("categories");

    Ok(csv.into_byte_records().map(move |record| -> ParsedRow {
        let record = record.with_context(|| format!("Failed to read {} row", source))?;
        let barcode = normalize_barcode(&field(&record, code_col));
        if barcode.is_empty() {
            return Ok(None);
        }

        let Some(name) = name_cols
            .iter()
            .find_map(|&col| normalize_optional(Some(&field(&record, col))))
        else {
            return Ok(None);
        };

        let brand = first_token(Some(&field(&record, brands_col)));
        let category = first_token(Some(&field(&record, categories_col)));

        Ok(build_candidate(
            barcode, name, brand, category, source, rank, lexicon,
        ))
    }))
}

fn build_candidate(
    barcode: String,
    name: String,
    brand: Option<String>,
    category: Option<String>,
    source: &'static str,
    rank: u32,
    lexicon: &Lexicon,
) -> Option<Candidate> {
    if barcode.is_empty() || name.is_empty() {
        return None;
    }
    let quality_score = quality_score(&name, &barcode, lexicon);
    Some(Candidate {
        barcode,
        name,
        brand,
        category,
        source,
        source_rank: rank,
        quality_score,
    })
}

/// Header row of a named-column dataset.
struct Headers(Vec<String>);

impl Headers {
    fn read<R: Read>(csv: &mut csv::Reader<R>) -> Result<Self> {
        let names = csv
            .byte_headers()?
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let name = decode_field(raw);
                let name: &str = if i == 0 {
                    name.trim_start_matches('\u{FEFF}')
                } else {
                    &name
                };
                name.to_string()
            })
            .collect();
        Ok(Self(names))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|h| h == name)
    }
}

/// Missing columns read as empty so the row fails its required-field checks.
fn field(record: &ByteRecord, col: Option<usize>) -> Cow<'_, str> {
    col.and_then(|i| record.get(i))
        .map(decode_field)
        .unwrap_or(Cow::Borrowed(""))
}

/// Decodes UTF-8, dropping invalid byte sequences.
fn decode_field(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(
            String::from_utf8_lossy(bytes)
                .chars()
                .filter(|&c| c != char::REPLACEMENT_CHARACTER)
                .collect(),
        ),
    }
}
