//! Names given to content in the external store.

use chrono::NaiveDate;

/// Placeholder used when an incoming document arrives without a number.
pub const UNNUMBERED: &str = "unnumbered";

/// `"{number} {creation_date}"`.
pub fn content_label(number: &str, creation_date: NaiveDate) -> String {
    let number = number.trim();
    let number = if number.is_empty() { UNNUMBERED } else { number };
    format!("{number} {}", creation_date.format("%Y-%m-%d"))
}

/// `"{label}: {suffix}"`, used for content folders and single files.
pub fn content_name(label: &str, suffix: &str) -> String {
    format!("{label}: {suffix}")
}

/// `base` with the extension of `original`, if it has one.
pub fn with_extension(base: &str, original: &str) -> String {
    match original.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() && !ext.contains(' ') => {
            format!("{base}.{ext}")
        }
        _ => base.to_string(),
    }
}
