//! Edit-distance ratios in the style of RapidFuzz's `fuzz` module.
//!
//! All ratios return a fraction in `[0, 1]` and are symmetric in their
//! arguments. [`wratio`] is the one the scorer uses: OCR output tends to
//! reorder, truncate or split name tokens, and plain edit distance punishes
//! all three.

use std::collections::BTreeSet;
use strsim::normalized_levenshtein;

/// Weight applied to `partial_ratio` before length adjustment.
pub const PARTIAL_WEIGHT: f64 = 0.9;

/// Weight applied to the token-based ratios.
pub const TOKEN_WEIGHT: f64 = 0.95;

/// Partial multiplier when one string is more than 8x the other.
const LENGTH_PENALTY_LONG: f64 = 0.67;

/// Partial multiplier for a length ratio in (1.5, 8].
const LENGTH_PENALTY_MEDIUM: f64 = 1.0;

/// Partial multiplier for a length ratio of at most 1.5.
const LENGTH_PENALTY_SHORT: f64 = 1.056;

/// Normalized Levenshtein similarity: `1 - distance / max_len`, with two
/// empty strings counting as identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

/// Best match of the shorter string against every same-length window of
/// the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (len_a, len_b) = (a.chars().count(), b.chars().count());
    let (needle, needle_len, haystack) = if len_a <= len_b {
        (a, len_a, b)
    } else {
        (b, len_b, a)
    };
    if len_a == len_b {
        return ratio(needle, haystack);
    }
    let haystack: Vec<char> = haystack.chars().collect();
    let mut best = 0.0f64;
    for window in haystack.windows(needle_len) {
        let window: String = window.iter().collect();
        best = best.max(ratio(needle, &window));
        if best == 1.0 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Ratio after sorting whitespace tokens; insensitive to word order.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn join(tokens: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    tokens
        .into_iter()
        .map(|t| t.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Set-based token comparison: the shared tokens are compared against each
/// side's shared-plus-unique tokens and the best of those ratios wins.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let intersection = join(set_a.intersection(&set_b));
    let with_rest = |rest: String| match (intersection.is_empty(), rest.is_empty()) {
        (_, true) => intersection.clone(),
        (true, false) => rest,
        (false, false) => format!("{intersection} {rest}"),
    };
    let combined_a = with_rest(join(set_a.difference(&set_b)));
    let combined_b = with_rest(join(set_b.difference(&set_a)));

    let (shared_a, shared_b) = if intersection.is_empty() {
        (0.0, 0.0)
    } else {
        (
            ratio(&intersection, &combined_a),
            ratio(&intersection, &combined_b),
        )
    };
    let sorted = ratio(&join(&set_a), &join(&set_b));

    shared_a
        .max(shared_b)
        .max(ratio(&combined_a, &combined_b))
        .max(sorted)
}

///
/// Weighted ratio: the best of the plain ratio, a length-weighted partial
/// ratio and the token ratios.
///
/// Two empty strings are identical (1.0); an empty string against a
/// non-empty one scores 0.0.
///
/// ```
/// use voter_dedup_service::fuzz::wratio;
/// assert_eq!(wratio("ravi kumar", "kumar ravi"), 0.95);
/// assert_eq!(wratio("ravi kumar", ""), 0.0);
/// ```
pub fn wratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let len_ratio = len_a.max(len_b) as f64 / len_a.min(len_b) as f64;

    let length_penalty = if len_ratio > 8.0 {
        LENGTH_PENALTY_LONG
    } else if len_ratio > 1.5 {
        LENGTH_PENALTY_MEDIUM
    } else {
        LENGTH_PENALTY_SHORT
    };
    let partial = partial_ratio(a, b) * (PARTIAL_WEIGHT * length_penalty).min(1.0);
    let token_sort = token_sort_ratio(a, b) * TOKEN_WEIGHT;
    let token_set = token_set_ratio(a, b) * TOKEN_WEIGHT;

    ratio(a, b).max(partial).max(token_sort).max(token_set)
}
