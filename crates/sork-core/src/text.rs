//! Small text helpers shared by checks.

/// Converts a byte offset into a 1-indexed `(line, column)` pair.
///
/// Returns `None` if `index` is outside of `text`.
#[must_use]
pub fn index_to_line_and_column(text: &str, index: usize) -> Option<(usize, usize)> {
    if index >= text.len() {
        return None;
    }

    let mut remaining = index;
    for (line_index, line) in text.split_inclusive('\n').enumerate() {
        if remaining < line.len() {
            return Some((line_index + 1, remaining + 1));
        }
        remaining -= line.len();
    }

    None
}

/// Removes a single trailing `ch`, if present.
#[must_use]
pub fn strip_single_suffix(text: &str, ch: char) -> &str {
    text.strip_suffix(ch).unwrap_or(text)
}
