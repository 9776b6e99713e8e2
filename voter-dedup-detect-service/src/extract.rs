//! Line filtering and field splitting for extracted voter-roll text.
//!
//! Both are best-effort heuristics. Text extraction flattens the roll's
//! layout, so a line is not guaranteed to hold exactly one voter.

use voter_dedup_service::normalize::normalize;

/// Lines shorter than this, once normalized, are page furniture (rules,
/// serial numbers) rather than names.
pub const MIN_LINE_CHARS: usize = 3;

/// Lines worth comparing, trimmed, with their 1-based line numbers.
pub fn extract_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| normalize(line).chars().count() >= MIN_LINE_CHARS)
}

///
/// Splits a line into `[name, father_name]`: the first two whitespace
/// tokens are the name, the next two the father's name. Either may come
/// back empty, and anything past the fourth token is dropped.
///
pub fn split_fields(line: &str) -> [String; 2] {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let name = tokens.iter().take(2).copied().collect::<Vec<_>>().join(" ");
    let father = tokens.iter().skip(2).take(2).copied().collect::<Vec<_>>().join(" ");
    [name, father]
}
