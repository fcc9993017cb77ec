//! `aws-sdk-s3` implementation of [`ObjectStore`].
//!
//! Handlers are synchronous, so each call is driven to completion on the
//! current Tokio runtime with `block_in_place`. This requires the
//! multi-thread runtime the Lambda binaries start.

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use docgen_core::storage_keys::StorageLocation;

use crate::adapters::object_store::{ObjectStore, StorageError, StorageErrorKind};

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    s3_client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(s3_client: aws_sdk_s3::Client) -> Self {
        Self { s3_client }
    }
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Sorts an SDK failure into the storage taxonomy by service error code,
/// falling back to the HTTP status for responses without a body (HEAD).
fn classify<E: ProvideErrorMetadata>(error: &SdkError<E, HttpResponse>) -> StorageErrorKind {
    let status = error
        .raw_response()
        .map(|response| response.status().as_u16());
    classify_code(error.code(), status)
}

pub fn classify_code(code: Option<&str>, status: Option<u16>) -> StorageErrorKind {
    match (code, status) {
        (Some("NoSuchBucket" | "AccessDenied" | "AllAccessDisabled" | "InvalidBucketName"), _) => {
            StorageErrorKind::BucketUnavailable
        }
        (Some("NoSuchKey" | "NotFound"), _) => StorageErrorKind::NotFound,
        (_, Some(403)) => StorageErrorKind::BucketUnavailable,
        (_, Some(404)) => StorageErrorKind::NotFound,
        _ => StorageErrorKind::Other,
    }
}

impl ObjectStore for S3ObjectStore {
    fn get_object(&self, location: &StorageLocation) -> Result<Vec<u8>, StorageError> {
        let client = self.s3_client.clone();
        block_on(async move {
            let output = client
                .get_object()
                .bucket(&location.bucket)
                .key(&location.key)
                .send()
                .await
                .map_err(|error| {
                    StorageError::new(
                        classify(&error),
                        format!("failed to read object {location}: {}", error_text(&error)),
                    )
                })?;
            let body = output.body.collect().await.map_err(|error| {
                StorageError::other(format!("failed to read body of {location}: {error}"))
            })?;
            Ok(body.into_bytes().to_vec())
        })
    }

    fn put_object(&self, location: &StorageLocation, body: &[u8]) -> Result<(), StorageError> {
        let client = self.s3_client.clone();
        let body_bytes = body.to_vec();
        block_on(async move {
            client
                .put_object()
                .bucket(&location.bucket)
                .key(&location.key)
                .body(ByteStream::from(body_bytes))
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    StorageError::new(
                        classify(&error),
                        format!("failed to write object {location}: {}", error_text(&error)),
                    )
                })
        })
    }

    fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        let client = self.s3_client.clone();
        block_on(async move {
            let mut keys = Vec::new();
            let mut continuation_token = None;
            loop {
                let mut request = client.list_objects_v2().bucket(bucket);
                if let Some(token) = continuation_token.take() {
                    request = request.continuation_token(token);
                }
                let response = request.send().await.map_err(|error| {
                    StorageError::new(
                        classify(&error),
                        format!("failed to list bucket {bucket}: {}", error_text(&error)),
                    )
                })?;

                keys.extend(
                    response
                        .contents()
                        .iter()
                        .filter_map(|object| object.key().map(ToOwned::to_owned)),
                );

                if response.is_truncated() == Some(true) {
                    continuation_token = response.next_continuation_token().map(ToOwned::to_owned);
                    if continuation_token.is_none() {
                        break;
                    }
                } else {
                    break;
                }
            }
            Ok(keys)
        })
    }

    fn object_exists(&self, location: &StorageLocation) -> Result<bool, StorageError> {
        let client = self.s3_client.clone();
        block_on(async move {
            match client
                .head_object()
                .bucket(&location.bucket)
                .key(&location.key)
                .send()
                .await
            {
                Ok(_) => Ok(true),
                Err(error) => match classify(&error) {
                    // HEAD answers a bare 404 for a missing bucket too.
                    StorageErrorKind::NotFound => {
                        match client.head_bucket().bucket(&location.bucket).send().await {
                            Ok(_) => Ok(false),
                            Err(bucket_error) => Err(StorageError::new(
                                match classify(&bucket_error) {
                                    StorageErrorKind::Other => StorageErrorKind::Other,
                                    _ => StorageErrorKind::BucketUnavailable,
                                },
                                format!(
                                    "failed to check bucket {}: {}",
                                    location.bucket,
                                    error_text(&bucket_error)
                                ),
                            )),
                        }
                    }
                    kind => Err(StorageError::new(
                        kind,
                        format!("failed to check object {location}: {}", error_text(&error)),
                    )),
                },
            }
        })
    }
}

fn error_text<E>(error: &SdkError<E, HttpResponse>) -> String
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match (error.code(), error.message()) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(code), None) => code.to_string(),
        _ => DisplayErrorContext(error).to_string(),
    }
}
