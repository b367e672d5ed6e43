//! Canonicalization of raw dataset fields.

/// Trims and collapses every whitespace run to a single space.
pub fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps only the ASCII decimal digits, in order. Other Unicode digits such as
/// full-width `４` are dropped.
pub fn normalize_barcode(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    let text = normalize_text(value?);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// First comma-separated token of a multi-value field such as `brands`.
pub fn first_token(value: Option<&str>) -> Option<String> {
    let text = normalize_optional(value)?;
    normalize_optional(text.split(',').next())
}
