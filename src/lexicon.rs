use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Language data consulted by the name filter and scorer.
///
/// The built-in default targets Russian-language datasets. A JSON file with the
/// same field names can replace it for another language:
///
/// ```json
/// {
///   "placeholder": "поиск",
///   "generic_tokens": ["штрихкод", "barcode"],
///   "alphabets": [["A", "Z"], ["a", "z"], ["А", "я"]]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Lexicon {
    /// Lowercase word rejected when it is the entire name
    pub placeholder: String,
    /// Lowercase substrings marking a name as generic noise
    pub generic_tokens: Vec<String>,
    /// Inclusive character ranges that count as letters for the filter
    pub alphabets: Vec<(char, char)>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            placeholder: "поиск".to_string(),
            generic_tokens: ["штрих-код", "штрихкод", "barcode", "поиск"]
                .into_iter()
                .map(String::from)
                .collect(),
            alphabets: vec![('A', 'Z'), ('a', 'z'), ('А', 'я'), ('Ё', 'Ё'), ('ё', 'ё')],
        }
    }
}

impl Lexicon {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open lexicon file: {:?}", path))?;
        let lexicon: Lexicon = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse lexicon file: {:?}", path))?;
        info!(
            path = ?path,
            tokens = lexicon.generic_tokens.len(),
            alphabets = lexicon.alphabets.len(),
            "Lexicon loaded"
        );
        Ok(lexicon)
    }

    pub fn is_letter(&self, c: char) -> bool {
        self.alphabets.iter().any(|&(lo, hi)| lo <= c && c <= hi)
    }

    /// `lower` must already be lowercased.
    pub fn has_generic_token(&self, lower: &str) -> bool {
        self.generic_tokens
            .iter()
            .any(|token| lower.contains(token.as_str()))
    }
}
