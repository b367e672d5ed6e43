use crate::lexicon::Lexicon;
use crate::models::{Candidate, ProductRow};
use crate::quality::{is_valid_name, rank_key};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use tracing::trace;

/// Keeps the single best candidate per barcode.
///
/// A candidate replaces the stored one only when its [`rank_key`] is strictly
/// greater, so on a full tie the first one offered stays. Results therefore depend
/// on offer order, and sources must be fed in their fixed priority order.
pub struct CandidateAggregator<'a> {
    lexicon: &'a Lexicon,
    best_by_barcode: FxHashMap<String, Candidate>,
    total_seen: u64,
    total_valid: u64,
}

impl<'a> CandidateAggregator<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self {
            lexicon,
            best_by_barcode: FxHashMap::default(),
            total_seen: 0,
            total_valid: 0,
        }
    }

    pub fn offer(&mut self, candidate: Candidate) {
        self.total_seen += 1;
        if !is_valid_name(&candidate.name, &candidate.barcode, self.lexicon) {
            trace!(
                barcode = candidate.barcode.as_str(),
                name = candidate.name.as_str(),
                "Rejected name"
            );
            return;
        }
        self.total_valid += 1;

        match self.best_by_barcode.entry(candidate.barcode.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(candidate);
            }
            Entry::Occupied(mut slot) => {
                if rank_key(&candidate) > rank_key(slot.get()) {
                    trace!(
                        barcode = candidate.barcode.as_str(),
                        from = slot.get().source,
                        to = candidate.source,
                        "Replaced winner"
                    );
                    slot.insert(candidate);
                }
            }
        }
    }

    pub fn total_seen(&self) -> u64 {
        self.total_seen
    }

    pub fn total_valid(&self) -> u64 {
        self.total_valid
    }

    pub fn unique(&self) -> usize {
        self.best_by_barcode.len()
    }

    pub fn get(&self, barcode: &str) -> Option<&Candidate> {
        self.best_by_barcode.get(barcode)
    }

    /// Drains the winners into output rows sorted by barcode.
    pub fn into_rows(self, fallback_category: &str, updated_at: &str) -> Vec<ProductRow> {
        let mut rows: Vec<ProductRow> = self
            .best_by_barcode
            .into_values()
            .map(|candidate| ProductRow::from_candidate(candidate, fallback_category, updated_at))
            .collect();
        rows.sort_unstable_by(|a, b| a.barcode.cmp(&b.barcode));
        rows
    }
}
