//! Handler configuration, read once per cold start and passed into every
//! invocation.

use std::path::PathBuf;

use docgen_core::error::DocumentError;
pub use docgen_core::storage_keys::BucketSource;
use docgen_core::storage_keys::BucketIdentifierFormat;

pub const REGION_ENV: &str = "AWS_REGION";
pub const TEMPLATES_BUCKET_ENV: &str = "TEMPLATES_BUCKET";
pub const OUTPUT_BUCKET_ENV: &str = "OUTPUT_BUCKET";
pub const BUCKET_SOURCE_ENV: &str = "DOCGEN_BUCKET_SOURCE";
pub const BUCKET_FORMAT_ENV: &str = "DOCGEN_BUCKET_FORMAT";
pub const SCRATCH_DIR_ENV: &str = "DOCGEN_SCRATCH_DIR";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be one of {expected}, got '{value}'")]
    InvalidValue {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    pub region: Option<String>,
    pub bucket_source: BucketSource,
    pub bucket_format: BucketIdentifierFormat,
    pub template_bucket: Option<String>,
    pub output_bucket: Option<String>,
    pub scratch_dir: PathBuf,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            region: None,
            bucket_source: BucketSource::Request,
            bucket_format: BucketIdentifierFormat::Arn,
            template_bucket: None,
            output_bucket: None,
            scratch_dir: std::env::temp_dir(),
        }
    }
}

impl HandlerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bucket_source = match read(BUCKET_SOURCE_ENV) {
            Some(value) => {
                BucketSource::parse(&value).ok_or(ConfigError::InvalidValue {
                    name: BUCKET_SOURCE_ENV,
                    value,
                    expected: "request, environment",
                })?
            }
            None => BucketSource::Request,
        };

        let bucket_format = match read(BUCKET_FORMAT_ENV) {
            Some(value) => {
                BucketIdentifierFormat::parse(&value).ok_or(ConfigError::InvalidValue {
                    name: BUCKET_FORMAT_ENV,
                    value,
                    expected: "arn, name",
                })?
            }
            None => BucketIdentifierFormat::Arn,
        };

        Ok(Self {
            region: read(REGION_ENV),
            bucket_source,
            bucket_format,
            template_bucket: read(TEMPLATES_BUCKET_ENV),
            output_bucket: read(OUTPUT_BUCKET_ENV),
            scratch_dir: read(SCRATCH_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
        })
    }

    pub fn region(&self) -> Result<&str, DocumentError> {
        required(self.region.as_deref(), REGION_ENV)
    }

    pub fn configured_template_bucket(&self) -> Result<&str, DocumentError> {
        required(self.template_bucket.as_deref(), TEMPLATES_BUCKET_ENV)
    }

    pub fn configured_output_bucket(&self) -> Result<&str, DocumentError> {
        required(self.output_bucket.as_deref(), OUTPUT_BUCKET_ENV)
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, DocumentError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(DocumentError::MissingConfiguration(name.to_string())),
    }
}
