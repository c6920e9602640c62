//! Conversions between line sequences and editable text blocks.
//!
//! Package policy sections ([`Document::inclusions`] and alike) are stored as
//! sequences of short lines, but edited as a single multi-line string.
//!
//! [`Document::inclusions`]: super::Document::inclusions

/// Joins the provided `lines` into a single editable text block.
///
/// Blank lines are skipped.
#[must_use]
pub fn to_editable<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::new();
    for line in lines.iter().map(AsRef::as_ref) {
        if line.trim().is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

/// Splits the provided editable `text` block into trimmed non-empty lines.
#[must_use]
pub fn from_editable(text: &str) -> Vec<String> {
    non_blank(text.split('\n'))
}

/// Trims the provided `items`, dropping the blank ones.
#[must_use]
pub fn non_blank<S: AsRef<str>>(
    items: impl IntoIterator<Item = S>,
) -> Vec<String> {
    items
        .into_iter()
        .filter_map(|s| {
            let s = s.as_ref().trim();
            (!s.is_empty()).then(|| s.to_owned())
        })
        .collect()
}

/// Normalizes the provided multi-line `text`, keeping it a single string of
/// trimmed non-empty lines.
#[must_use]
pub fn normalize(text: &str) -> String {
    from_editable(text).join("\n")
}
