use serde::Serialize;

/// One dataset's proposed display name for a barcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub barcode: String,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub source: &'static str,
    pub source_rank: u32,
    pub quality_score: i64,
}

/// A winner as persisted in the `products` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRow {
    pub barcode: String,
    pub name: String,
    pub brand: Option<String>,
    pub category: String,
    pub source: String,
    pub source_rank: u32,
    pub quality_score: i64,
    pub updated_at: String,
}

impl ProductRow {
    pub fn from_candidate(candidate: Candidate, fallback_category: &str, updated_at: &str) -> Self {
        Self {
            barcode: candidate.barcode,
            name: candidate.name,
            brand: candidate.brand,
            category: candidate
                .category
                .unwrap_or_else(|| fallback_category.to_string()),
            source: candidate.source.to_string(),
            source_rank: candidate.source_rank,
            quality_score: candidate.quality_score,
            updated_at: updated_at.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(category: Option<&str>) -> Candidate {
        Candidate {
            barcode: "4601576009686".to_string(),
            name: "МАЙОНЕЗ".to_string(),
            brand: None,
            category: category.map(str::to_string),
            source: "catalog",
            source_rank: 200,
            quality_score: 11,
        }
    }

    #[test]
    fn missing_category_uses_fallback() {
        let row = ProductRow::from_candidate(candidate(None), "Продукты", "2024-01-01T00:00:00.000000Z");
        assert_eq!(row.category, "Продукты");
        assert_eq!(row.source, "catalog");
        assert_eq!(row.updated_at, "2024-01-01T00:00:00.000000Z");
    }

    #[test]
    fn present_category_is_kept() {
        let row = ProductRow::from_candidate(candidate(Some("Соусы")), "Продукты", "t");
        assert_eq!(row.category, "Соусы");
    }
}
