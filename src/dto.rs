use crate::candidates::Strategy;
use crate::detect::{ClaimPolicy, DetectConfig};
use crate::locale::Locale;
use crate::score::FieldMode;
use serde::{Deserialize, Serialize};

/// Default match sensitivity, in percent.
pub const DEFAULT_THRESHOLD: f64 = 85.0;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DataFile {
    pub bucket: String,
    pub key: String,
}

///
/// One detection run. `files` are UTF-8 text files holding one extracted
/// voter-roll line per line; `output` is where the CSV report goes.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupConfig {
    pub files: Vec<DataFile>,
    pub output: DataFile,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub mode: FieldMode,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub policy: ClaimPolicy,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub locale: Locale,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl DedupConfig {
    pub fn detect_config(&self) -> DetectConfig {
        DetectConfig {
            threshold: self.threshold,
            policy: self.policy,
            limit: self.limit,
        }
    }
}

/// Response body of a completed run.
#[derive(Debug, Deserialize, Serialize)]
pub struct RunSummary {
    pub bucket: String,
    pub key: String,
    pub records: usize,
    pub duplicates: usize,
    pub message: String,
}
