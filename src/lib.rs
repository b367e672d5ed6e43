//! Barcode index: offline barcode-to-product-name table builder
//!
//! This crate turns several noisy, differently-trusted product datasets into a single
//! SQLite table holding exactly one display name per barcode, for instant offline
//! lookup on a mobile device.
//!
//! 1. **Discovery** -- Resolve the dataset files present in the raw directory, in fixed
//!    priority order: reference catalog archives, secondary catalog, open datasets
//! 2. **Parsing** -- Stream rows out of zip/gzip containers, normalize fields and build
//!    scored candidates
//! 3. **Aggregation** -- Filter unusable names and keep the best candidate per barcode
//! 4. **Persistence** -- Replace the contents of the `products` table in one transaction
//!
//! # Winner Selection
//!
//! Candidates are compared on `(source_rank, quality_score, name length)`. A newcomer
//! replaces the stored winner only when strictly greater, so exact ties keep whichever
//! candidate arrived first. Sources are processed sequentially so that this stays
//! reproducible across runs.
//!
//! # Key Modules
//!
//! - [`normalize`] -- Whitespace collapsing, digit-only barcodes, empty-to-absent
//! - [`lexicon`] -- Language data (noise tokens, placeholder word, alphabets)
//! - [`quality`] -- Name validity filter and quality score
//! - [`parser`] -- Row parsers for the three dataset shapes
//! - [`sources`] -- Container access and dataset discovery
//! - [`aggregate`] -- Best-candidate-per-barcode aggregation
//! - [`store`] -- SQLite index writer and lookup
//! - [`pipeline`] -- The full build run
//! - [`stats`] -- Per-source counters and the run summary
//! - [`models`] -- Core data types (Candidate, ProductRow)
//! - [`config`] -- Ranks, file names and other constants
//!
//! # Example Usage
//!
//! ```bash
//! # Build from the default datasets
//! barcode-index build --raw-dir data/raw --output data/index/barcode_local_index.sqlite
//!
//! # Include the (large) food dataset too
//! barcode-index build --raw-dir data/raw --output index.sqlite --include-off-food
//!
//! # Query the result
//! barcode-index lookup --index index.sqlite 4601576009686
//! ```

pub mod aggregate;
pub mod config;
pub mod lexicon;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod quality;
pub mod sources;
pub mod stats;
pub mod store;
