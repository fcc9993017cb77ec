use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

pub const TEMPLATE_KEY_PREFIX: &str = "documents/";
pub const S3_ARN_PREFIX: &str = "arn:aws:s3:::";

/// How callers spell bucket identifiers in query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketIdentifierFormat {
    /// Bare bucket names, e.g. `my-templates`.
    Name,
    /// S3 bucket ARNs, e.g. `arn:aws:s3:::my-templates`.
    Arn,
}

impl BucketIdentifierFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            "arn" => Some(Self::Arn),
            _ => None,
        }
    }
}

/// Where bucket identifiers for a create request come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketSource {
    /// `templateBucket` / `outputBucket` query parameters.
    Request,
    /// `TEMPLATES_BUCKET` / `OUTPUT_BUCKET` environment variables.
    Environment,
}

impl BucketSource {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "request" => Some(Self::Request),
            "environment" | "env" => Some(Self::Environment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocation {
    pub bucket: String,
    pub key: String,
}

impl StorageLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Object key of a template. Bare names are placed under [`TEMPLATE_KEY_PREFIX`].
pub fn template_key(template: &str) -> String {
    let trimmed = template.trim_start_matches('/');
    if trimmed.starts_with(TEMPLATE_KEY_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{TEMPLATE_KEY_PREFIX}{trimmed}")
    }
}

pub fn resolve_bucket_name(
    raw: &str,
    format: BucketIdentifierFormat,
) -> Result<String, DocumentError> {
    let raw = raw.trim();
    let name = match format {
        BucketIdentifierFormat::Name => raw,
        BucketIdentifierFormat::Arn => raw.strip_prefix(S3_ARN_PREFIX).ok_or_else(|| {
            DocumentError::SchemaValidation(format!("'{raw}' is not an S3 bucket ARN"))
        })?,
    };

    if name.trim().is_empty() {
        return Err(DocumentError::SchemaValidation(
            "bucket identifier cannot be empty".to_string(),
        ));
    }

    Ok(name.to_string())
}

/// Public URL of an object. The key is used as given, without re-encoding.
pub fn object_location_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{bucket}.s3.{region}.amazonaws.com/{key}")
}
