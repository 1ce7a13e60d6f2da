//! Narration text derived from speaker notes.

/// Placeholder spoken over slides without notes.
fn placeholder(number: usize) -> String {
    format!("This is slide number {}.", number)
}

/// Narration for slide `number` (1-based).
///
/// Uses the notes text when it is non-empty after trimming, otherwise the
/// placeholder.
pub fn narration_text(number: usize, notes: Option<&str>) -> String {
    match notes.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => placeholder(number),
    }
}

/// Trim and flatten multi-line text onto a single line. Each line break
/// becomes one space; spacing within a line is kept.
pub fn single_line(text: &str) -> String {
    text.trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
