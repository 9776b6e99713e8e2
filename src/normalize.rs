//! Canonical comparison keys for extracted text.
//!
//! Every field is passed through [`normalize`] before it can reach the
//! scorer, so OCR noise in casing and punctuation never dominates a score.

/// Lower-cases `raw`, keeps alphanumerics (plus Indic combining marks) and
/// whitespace, collapses whitespace runs to a single space and trims.
///
/// ```
/// use voter_dedup_service::normalize::normalize;
/// assert_eq!(normalize("  SMITH,  John. "), "smith john");
/// ```
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for c in raw.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
        } else if keep(c) {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}

pub fn normalize_fields<S: AsRef<str>>(fields: &[S]) -> Vec<String> {
    fields.iter().map(|f| normalize(f.as_ref())).collect()
}

#[inline]
fn keep(c: char) -> bool {
    c.is_alphanumeric() || is_indic_mark(c)
}

// Viramas, nuktas and some vowel signs are not `Alphabetic`, but dropping
// them changes the name. Dandas are punctuation and still go.
#[inline]
fn is_indic_mark(c: char) -> bool {
    ('\u{0900}'..='\u{0DFF}').contains(&c) && !matches!(c, '\u{0964}' | '\u{0965}')
}
