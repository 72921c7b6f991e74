//! Tag markers embedded in document templates.
//!
//! A template marks each substitutable span with `#TAG#<name>#`. The
//! store turns every marker into a named range keyed by `<name>`.
//! Offsets are reported in UTF-16 code units because that is how the
//! document API addresses body content.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#TAG#([A-Za-z][A-Za-z0-9_]*)#").expect("tag pattern is a valid regex")
});

/// A tag marker found in a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMarker {
    /// The tag's inner name.
    pub name: String,
    /// Byte range of the whole marker within the scanned text.
    pub bytes: Range<usize>,
    /// Start of the marker in UTF-16 code units.
    pub utf16_start: usize,
    /// End (exclusive) of the marker in UTF-16 code units.
    pub utf16_end: usize,
}

/// Find every tag marker in `text`, in order of appearance.
pub fn find_tags(text: &str) -> Vec<TagMarker> {
    TAG_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str().to_string();
            let utf16_start = utf16_len(&text[..whole.start()]);
            let utf16_end = utf16_start + utf16_len(whole.as_str());
            Some(TagMarker {
                name,
                bytes: whole.range(),
                utf16_start,
                utf16_end,
            })
        })
        .collect()
}

/// Whether `text` contains at least one tag marker.
pub fn contains_tags(text: &str) -> bool {
    TAG_PATTERN.is_match(text)
}

/// Render the marker for a tag name.
pub fn marker_for(name: &str) -> String {
    format!("#TAG#{name}#")
}

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}
