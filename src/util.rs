use crate::dto::DataFile;
use crate::error::ServiceError;
use futures::stream::TryStreamExt;
use rusoto_core::Region;
use rusoto_s3::{GetObjectRequest, PutObjectRequest, S3Client, S3};
use std::env;
use std::str::FromStr;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

pub fn get_region() -> Result<Region, ServiceError> {
    let val = get_env_var("REGION")?;
    Region::from_str(&val).map_err(|_| {
        ServiceError::internal_server_error(format!("Unable to parse region {}", val))
    })
}

pub fn get_env_var(name: &str) -> Result<String, ServiceError> {
    env::var(name).map_err(|_| {
        ServiceError::internal_server_error(format!("Environment variable '{}' not found", name))
    })
}

pub async fn download_object_from_s3(
    client: &S3Client,
    file: &DataFile,
) -> Result<Vec<u8>, ServiceError> {
    let request = GetObjectRequest {
        bucket: file.bucket.clone(),
        key: file.key.clone(),
        ..Default::default()
    };
    let mut object = client.get_object(request).await.map_err(|err| {
        ServiceError::bad_request(format!("Unable to fetch {}/{}: {}", file.bucket, file.key, err))
    })?;
    let body = object
        .body
        .take()
        .ok_or_else(|| ServiceError::internal_server_error("Unable to extract body"))?;
    body.map_ok(|b| b.to_vec())
        .try_concat()
        .await
        .map_err(ServiceError::internal_server_error)
}

/// Downloads a text file, refusing anything that is not valid UTF-8.
pub async fn download_text_from_s3(
    client: &S3Client,
    file: &DataFile,
) -> Result<String, ServiceError> {
    let bytes = download_object_from_s3(client, file).await?;
    String::from_utf8(bytes).map_err(|err| {
        ServiceError::bad_request(format!("{}/{} is not UTF-8 text: {}", file.bucket, file.key, err))
    })
}

pub async fn upload_object_to_s3(
    client: &S3Client,
    object: Vec<u8>,
    file: &DataFile,
    content_type: &str,
) -> Result<(), ServiceError> {
    let request = PutObjectRequest {
        bucket: file.bucket.clone(),
        key: file.key.clone(),
        body: Some(object.into()),
        content_type: Some(content_type.to_string()),
        ..Default::default()
    };
    client
        .put_object(request)
        .await
        .map(|_| ())
        .map_err(ServiceError::internal_server_error)
}
