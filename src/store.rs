//! SQLite persistence of the winning rows.

use crate::models::ProductRow;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::fs;
use std::path::Path;
use tracing::info;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS products (
    barcode TEXT NOT NULL,
    name TEXT NOT NULL,
    brand TEXT,
    category TEXT,
    source TEXT NOT NULL,
    source_rank INTEGER NOT NULL,
    quality_score INTEGER NOT NULL,
    updated_at TEXT NOT NULL
)";

const CREATE_INDEXES: &str = "
CREATE UNIQUE INDEX IF NOT EXISTS idx_products_barcode ON products(barcode);
CREATE INDEX IF NOT EXISTS idx_products_source_rank_quality
    ON products(source_rank DESC, quality_score DESC);
";

const INSERT_ROW: &str = "INSERT INTO products (
    barcode, name, brand, category, source, source_rank, quality_score, updated_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const SELECT_COLUMNS: &str =
    "SELECT barcode, name, brand, category, source, source_rank, quality_score, updated_at \
     FROM products";

/// Replaces the contents of the `products` table with `rows`.
///
/// Runs in a single transaction: on any error nothing is committed and the previous
/// contents of an existing index stay intact.
pub fn write_index(path: &Path, rows: &[ProductRow]) -> Result<u64> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("Failed to open index database: {:?}", path))?;
    let tx = conn.transaction().context("Failed to start transaction")?;

    tx.execute(CREATE_TABLE, [])
        .context("Failed to create products table")?;
    tx.execute("DELETE FROM products", [])
        .context("Failed to clear products table")?;

    let mut written = 0u64;
    {
        let mut stmt = tx.prepare(INSERT_ROW)?;
        for row in rows {
            stmt.execute(params![
                row.barcode,
                row.name,
                row.brand,
                row.category,
                row.source,
                row.source_rank,
                row.quality_score,
                row.updated_at,
            ])
            .with_context(|| format!("Failed to insert barcode {}", row.barcode))?;
            written += 1;
        }
    }

    tx.execute_batch(CREATE_INDEXES)
        .context("Failed to create products indexes")?;
    tx.commit().context("Failed to commit index")?;

    info!(rows = written, path = ?path, "Index written");
    Ok(written)
}

/// Looks up one barcode in an existing index. `barcode` must already be normalized.
pub fn lookup(path: &Path, barcode: &str) -> Result<Option<ProductRow>> {
    let conn = open_read_only(path)?;
    conn.query_row(
        &format!("{} WHERE barcode = ?1", SELECT_COLUMNS),
        params![barcode],
        product_row,
    )
    .optional()
    .with_context(|| format!("Failed to query barcode {}", barcode))
}

pub fn count_rows(path: &Path) -> Result<u64> {
    let conn = open_read_only(path)?;
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))
        .context("Failed to count products")?;
    Ok(count as u64)
}

fn open_read_only(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open index database: {:?}", path))
}

fn product_row(row: &Row<'_>) -> rusqlite::Result<ProductRow> {
    Ok(ProductRow {
        barcode: row.get(0)?,
        name: row.get(1)?,
        brand: row.get(2)?,
        category: row.get(3)?,
        source: row.get(4)?,
        source_rank: row.get(5)?,
        quality_score: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
