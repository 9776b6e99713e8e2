mod extract;
mod util;

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use lazy_static::lazy_static;
use rusoto_core::{Client, Region};
use rusoto_s3::S3Client;
use serde_json::Value;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voter_dedup_service::detect::Detector;
use voter_dedup_service::dto::{DedupConfig, RunSummary};
use voter_dedup_service::error::ServiceError;
use voter_dedup_service::response::make_response_payload;
use voter_dedup_service::util::get_region;

lazy_static! {
    // AWS Region
    static ref REGION: Region = get_region().unwrap();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .init();
    run(service_fn(process)).await?;
    Ok(())
}

async fn process(event: LambdaEvent<DedupConfig>) -> Result<Value, Error> {
    let (config, _context) = event.into_parts();
    let result = dedup(config).await;
    if let Err(err) = &result {
        tracing::error!(status = err.status.code(), msg = %err.msg, "run failed");
    }
    make_response_payload(result)
}

async fn dedup(config: DedupConfig) -> Result<Value, ServiceError> {
    let detector = Detector::new(config.detect_config())
        .with_mode(config.mode)
        .with_strategy(config.strategy.clone());
    detector.validate()?;

    let start = Instant::now();
    let client = S3Client::new_with_client(Client::shared(), REGION.clone());
    let store = util::pull_data_files(&client, &config.files, config.mode).await?;
    info!(
        files = config.files.len(),
        records = store.len(),
        elapsed_secs = start.elapsed().as_secs_f64(),
        "{}",
        config.locale.processed()
    );

    let start = Instant::now();
    let detection = detector.run(&store)?;
    info!(
        duplicates = detection.len(),
        clusters = detection.clusters().len(),
        elapsed_secs = start.elapsed().as_secs_f64(),
        "dedupe completed"
    );

    util::push_result_file(&client, &config.output, detection.pairs()).await?;
    let summary = RunSummary {
        bucket: config.output.bucket.clone(),
        key: config.output.key.clone(),
        records: store.len(),
        duplicates: detection.len(),
        message: config.locale.summary(detection.len()),
    };
    serde_json::to_value(summary).map_err(ServiceError::internal_server_error)
}
