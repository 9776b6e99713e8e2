use crate::fuzz::wratio;
use crate::record::Record;
use serde::{Deserialize, Serialize};

/// Upper bound of every similarity score.
pub const MAX_SCORE: f64 = 100.0;

/// Trait for record similarity. Implementations must return a value in
/// `[0, 100]` and be symmetric in their arguments.
pub trait Similarity: Send + Sync {
    fn similarity(&self, a: &Record, b: &Record) -> f64;
}

impl<F> Similarity for F
where
    F: Fn(&Record, &Record) -> f64 + Send + Sync,
{
    fn similarity(&self, a: &Record, b: &Record) -> f64 {
        self(a, b)
    }
}

/// Which record fields take part in scoring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldMode {
    /// Compare the first field only.
    #[default]
    Single,
    /// Average over every field position (name, father name, ...).
    Multi,
}

/// [`wratio`]-based scorer over normalized record fields.
#[derive(Clone, Copy, Debug, Default)]
pub struct Scorer {
    mode: FieldMode,
}

impl Scorer {
    pub fn new(mode: FieldMode) -> Self {
        Scorer { mode }
    }

    ///
    /// Scores two records in `[0, 100]`.
    ///
    /// In multi-field mode a field present on one side only is compared
    /// against `""` and scores 0, pulling the mean down: a blank father
    /// name is evidence against a match, not a skipped column. Two blanks in
    /// the same position count as identical.
    ///
    /// A record whose compared fields are all empty has nothing to match
    /// on and scores 0 against everything, itself included.
    ///
    pub fn score(&self, a: &Record, b: &Record) -> f64 {
        if !self.has_key(a) || !self.has_key(b) {
            return 0.0;
        }
        match self.mode {
            FieldMode::Single => wratio(a.field(0), b.field(0)) * MAX_SCORE,
            FieldMode::Multi => {
                let width = a.fields().len().max(b.fields().len()).max(1);
                let total: f64 = (0..width).map(|i| wratio(a.field(i), b.field(i))).sum();
                total / width as f64 * MAX_SCORE
            }
        }
    }
}

impl Scorer {
    fn has_key(&self, record: &Record) -> bool {
        match self.mode {
            FieldMode::Single => !record.field(0).is_empty(),
            FieldMode::Multi => record.fields().iter().any(|f| !f.is_empty()),
        }
    }
}

impl Similarity for Scorer {
    fn similarity(&self, a: &Record, b: &Record) -> f64 {
        self.score(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Provenance, RecordStore};

    fn store(rows: &[&[&str]]) -> RecordStore {
        let mut store = RecordStore::new();
        for (i, fields) in rows.iter().copied().enumerate() {
            store.add(fields.join(" "), fields, Provenance::new("t.txt", i + 1));
        }
        store
    }

    #[test]
    fn test_single_field_typo() {
        let s = store(&[&["John Smith"], &["Jon Smith"]]);
        let score = Scorer::default().score(&s.all()[0], &s.all()[1]);
        assert_eq!(score, 90.0);
    }

    #[test]
    fn test_single_ignores_later_fields() {
        let s = store(&[&["ravi kumar", "suresh"], &["ravi kumar", ""]]);
        let score = Scorer::new(FieldMode::Single).score(&s.all()[0], &s.all()[1]);
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_multi_blank_father_penalized() {
        let s = store(&[&["ravi kumar", "suresh kumar"], &["ravi kumar", ""]]);
        let scorer = Scorer::new(FieldMode::Multi);
        assert_eq!(scorer.score(&s.all()[0], &s.all()[1]), 50.0);
    }

    #[test]
    fn test_multi_missing_field_compared_as_blank() {
        let s = store(&[&["ravi kumar", "suresh kumar"], &["ravi kumar"]]);
        let scorer = Scorer::new(FieldMode::Multi);
        assert_eq!(scorer.score(&s.all()[0], &s.all()[1]), 50.0);
    }

    #[test]
    fn test_multi_both_blank_fathers_match() {
        let s = store(&[&["ravi kumar", ""], &["ravi kumar", ""]]);
        let scorer = Scorer::new(FieldMode::Multi);
        assert_eq!(scorer.score(&s.all()[0], &s.all()[1]), 100.0);
    }

    #[test]
    fn test_no_fields_compares_raw_text() {
        let none: &[&str] = &[];
        let mut s = RecordStore::new();
        s.add("Ravi Kumar", none, Provenance::new("t.txt", 1));
        s.add("Mary Jones", none, Provenance::new("t.txt", 2));
        s.add("RAVI KUMAR", none, Provenance::new("t.txt", 3));
        let scorer = Scorer::default();
        assert!(scorer.score(&s.all()[0], &s.all()[1]) < 50.0);
        assert_eq!(scorer.score(&s.all()[0], &s.all()[2]), 100.0);
    }

    #[test]
    fn test_empty_keys_never_match() {
        let s = store(&[&["-----"], &["====="], &["", ""], &["ravi kumar"]]);
        for mode in [FieldMode::Single, FieldMode::Multi] {
            let scorer = Scorer::new(mode);
            let all = s.all();
            assert_eq!(scorer.score(&all[0], &all[1]), 0.0);
            assert_eq!(scorer.score(&all[0], &all[0]), 0.0);
            assert_eq!(scorer.score(&all[2], &all[2]), 0.0);
            assert_eq!(scorer.score(&all[0], &all[3]), 0.0);
        }
    }

    #[test]
    fn test_single_blank_name_with_father_has_no_key() {
        let s = store(&[&["", "suresh"], &["", "suresh"]]);
        assert_eq!(Scorer::new(FieldMode::Single).score(&s.all()[0], &s.all()[1]), 0.0);
        assert_eq!(Scorer::new(FieldMode::Multi).score(&s.all()[0], &s.all()[1]), 100.0);
    }

    #[test]
    fn test_symmetric() {
        let s = store(&[&["abdul karim", "rahim"], &["karim abdul md", "rahim uddin"]]);
        for mode in [FieldMode::Single, FieldMode::Multi] {
            let scorer = Scorer::new(mode);
            let (a, b) = (&s.all()[0], &s.all()[1]);
            assert_eq!(scorer.score(a, b), scorer.score(b, a));
        }
    }

    #[test]
    fn test_closure_is_similarity() {
        let s = store(&[&["a"], &["b"]]);
        let constant = |_: &Record, _: &Record| 42.0;
        assert_eq!(constant.similarity(&s.all()[0], &s.all()[1]), 42.0);
    }

    #[test]
    fn test_field_mode_serde() {
        let mode: FieldMode = serde_json::from_str("\"multi\"").unwrap();
        assert_eq!(mode, FieldMode::Multi);
    }
}
