use crate::detect::DuplicatePair;
use csv::Writer;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report row: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush report: {0}")]
    Flush(String),
}

/// Column names of the report, in order.
pub const HEADERS: [&str; 3] = ["Name", "Matched With", "Similarity Score"];

/// One line of the duplicate report. Field names follow [`HEADERS`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DuplicateRow<'a> {
    #[serde(rename = "Name")]
    pub name: &'a str,
    #[serde(rename = "Matched With")]
    pub matched_with: &'a str,
    #[serde(rename = "Similarity Score")]
    pub similarity_score: f64,
}

impl<'a> From<&DuplicatePair<'a>> for DuplicateRow<'a> {
    fn from(pair: &DuplicatePair<'a>) -> Self {
        DuplicateRow {
            name: pair.a.raw_text(),
            matched_with: pair.b.raw_text(),
            similarity_score: (pair.score * 100.0).round() / 100.0,
        }
    }
}

///
/// Renders pairs as a UTF-8 CSV document, in detection order, with a
/// header row.
///
pub fn write_csv(pairs: &[DuplicatePair]) -> Result<Vec<u8>, ReportError> {
    let mut writer = Writer::from_writer(vec![]);
    if pairs.is_empty() {
        writer.write_record(HEADERS)?;
    }
    for pair in pairs {
        writer.serialize(DuplicateRow::from(pair))?;
    }
    writer
        .into_inner()
        .map_err(|err| ReportError::Flush(err.to_string()))
}
