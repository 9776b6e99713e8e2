use crate::extract::{extract_lines, split_fields};
use rusoto_s3::S3Client;
use tracing::debug;
use voter_dedup_service::detect::DuplicatePair;
use voter_dedup_service::dto::DataFile;
use voter_dedup_service::error::ServiceError;
use voter_dedup_service::record::{Provenance, RecordStore};
use voter_dedup_service::report::write_csv;
use voter_dedup_service::score::FieldMode;
use voter_dedup_service::util::{download_text_from_s3, upload_object_to_s3, CSV_CONTENT_TYPE};

/// Downloads every input file, in order, into one record store.
pub async fn pull_data_files(
    client: &S3Client,
    files: &[DataFile],
    mode: FieldMode,
) -> Result<RecordStore, ServiceError> {
    let mut store = RecordStore::new();
    for file in files {
        let text = download_text_from_s3(client, file).await?;
        let before = store.len();
        fill_store(&mut store, &file.key, &text, mode);
        debug!(key = %file.key, records = store.len() - before, "file ingested");
    }
    Ok(store)
}

/// Adds one record per usable line of `text`.
pub fn fill_store(store: &mut RecordStore, source: &str, text: &str, mode: FieldMode) {
    for (line_no, line) in extract_lines(text) {
        let provenance = Provenance::new(source, line_no);
        match mode {
            FieldMode::Single => {
                store.add(line, &[line], provenance);
            }
            FieldMode::Multi => {
                store.add(line, &split_fields(line), provenance);
            }
        }
    }
}

pub async fn push_result_file(
    client: &S3Client,
    output: &DataFile,
    pairs: &[DuplicatePair<'_>],
) -> Result<(), ServiceError> {
    let object = write_csv(pairs)?;
    upload_object_to_s3(client, object, output, CSV_CONTENT_TYPE).await
}
