use crate::normalize::{normalize, normalize_fields};
use serde::Serialize;

/// Where an extracted line came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub file: String,
    /// 1-based line number within `file`.
    pub line: usize,
}

impl Provenance {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Provenance {
            file: file.into(),
            line,
        }
    }
}

/// One extracted voter-roll line. Immutable once it is in a [`RecordStore`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    index: usize,
    raw_text: String,
    fields: Vec<String>,
    source: Provenance,
}

impl Record {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Normalized comparison fields, e.g. `[name, father_name]`.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field(&self, i: usize) -> &str {
        self.fields.get(i).map_or("", String::as_str)
    }

    pub fn source(&self) -> &Provenance {
        &self.source
    }
}

///
/// Append-only, ordered collection of records. Indices are assigned in
/// insertion order and never reused.
///
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Appends a record and returns it. Fields are normalized here, so
    /// nothing un-normalized is ever compared.
    ///
    /// ## Arguments
    ///
    /// * `raw_text` - The original line, kept for display.
    /// * `fields` - Raw comparison fields (may contain blanks). When empty,
    ///   the normalized `raw_text` becomes the only field.
    /// * `source` - File and line the text was extracted from.
    ///
    pub fn add<S: AsRef<str>>(
        &mut self,
        raw_text: impl Into<String>,
        fields: &[S],
        source: Provenance,
    ) -> &Record {
        let index = self.records.len();
        let raw_text = raw_text.into();
        let fields = if fields.is_empty() {
            vec![normalize(&raw_text)]
        } else {
            normalize_fields(fields)
        };
        self.records.push(Record {
            index,
            raw_text,
            fields,
            source,
        });
        &self.records[index]
    }

    pub fn all(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
