//! Name usability filter and desirability score.
//!
//! Both functions take the name in raw form and normalize it first, so callers
//! holding a raw field and callers holding an already-normalized name get the same
//! answer.

use crate::config::SCORE_LENGTH_CAP;
use crate::lexicon::Lexicon;
use crate::models::Candidate;
use crate::normalize::{normalize_barcode, normalize_text};

const CASED_UPPER_PENALTY: i64 = 2;
const BARCODE_ECHO_PENALTY: i64 = 20;
const SHORT_NAME_PENALTY: i64 = 10;
const SHORT_NAME_LEN: usize = 6;
const GENERIC_TOKEN_PENALTY: i64 = 1000;

/// Slack allowed around a barcode before a name is considered more than an echo of it.
const BARCODE_ECHO_SLACK: usize = 4;

pub fn is_valid_name(raw_name: &str, barcode: &str, lexicon: &Lexicon) -> bool {
    let name = normalize_text(raw_name);
    if name.is_empty() {
        return false;
    }

    let lower = name.to_lowercase();
    if lower == lexicon.placeholder || lexicon.has_generic_token(&lower) {
        return false;
    }
    if name == barcode {
        return false;
    }
    if !name.chars().any(|c| lexicon.is_letter(c)) {
        return false;
    }

    let char_len = name.chars().count();
    if normalize_barcode(&name) == barcode
        && char_len <= barcode.chars().count() + BARCODE_ECHO_SLACK
    {
        return false;
    }

    true
}

pub fn quality_score(raw_name: &str, barcode: &str, lexicon: &Lexicon) -> i64 {
    let name = normalize_text(raw_name);
    let char_len = name.chars().count();
    let letters = name.chars().filter(|c| c.is_alphabetic()).count();

    let mut score = (letters * 2 + char_len.min(SCORE_LENGTH_CAP)) as i64;

    if is_upper_when_lowercased(&name) {
        score -= CASED_UPPER_PENALTY;
    }
    if !barcode.is_empty() && name.contains(barcode) {
        score -= BARCODE_ECHO_PENALTY;
    }
    if char_len < SHORT_NAME_LEN {
        score -= SHORT_NAME_PENALTY;
    }
    if lexicon.has_generic_token(&name.to_lowercase()) {
        score -= GENERIC_TOKEN_PENALTY;
    }

    score
}

/// Winner ordering key, compared lexicographically; larger wins.
pub fn rank_key(candidate: &Candidate) -> (u32, i64, usize) {
    (
        candidate.source_rank,
        candidate.quality_score,
        candidate.name.chars().count(),
    )
}

/// Upper-case test applied to the lowercased name: at least one upper-case letter
/// survives lowercasing and no lowercase letter is present. Ordinary all-caps names
/// lowercase cleanly, so they are not penalized.
fn is_upper_when_lowercased(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.chars().any(char::is_uppercase) && !lower.chars().any(char::is_lowercase)
}
