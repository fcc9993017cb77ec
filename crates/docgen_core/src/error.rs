//! Failure taxonomy for a single document request.
//!
//! Every failure a handler can produce is one variant of [`DocumentError`].
//! [`DocumentError::status_code`] is the only place that maps failures to HTTP
//! status codes.

/// A failed document request, tagged by what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// The event did not match the request schema or carried a non-JSON body.
    #[error("Failed schema validation: {0}")]
    SchemaValidation(String),

    /// The template key does not exist in the template bucket.
    #[error(
        "Failed to get template: {key} from {bucket}. Please verify template name and its existence."
    )]
    TemplateNotFound { bucket: String, key: String },

    /// The template bucket does not exist or cannot be read.
    #[error(
        "Failed to get template: {key} from {bucket}. Please verify bucket name and your access to it."
    )]
    BucketUnavailable { bucket: String, key: String },

    /// A required configuration value is unset or blank.
    #[error("Missing env {0}")]
    MissingConfiguration(String),

    /// The rendered document could not be written to the output bucket.
    #[error("Failed to upload generated document: {key} to {bucket}")]
    UploadFailure { bucket: String, key: String },

    /// The template could not be rendered with the supplied content.
    #[error("Failed to render document: {reason} template: {template}")]
    RenderFailure { template: String, reason: String },

    /// Any other fault. The reason is passed to the caller verbatim.
    #[error("Unhandled Server Error: {0}")]
    Unhandled(String),
}

impl DocumentError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::SchemaValidation(_) => 400,
            Self::BucketUnavailable { .. } => 403,
            Self::TemplateNotFound { .. } => 404,
            Self::MissingConfiguration(_)
            | Self::UploadFailure { .. }
            | Self::RenderFailure { .. }
            | Self::Unhandled(_) => 500,
        }
    }

    /// Stable machine-readable code placed next to the message in error bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaValidation(_) => "validation_error",
            Self::TemplateNotFound { .. } => "template_not_found",
            Self::BucketUnavailable { .. } => "bucket_unavailable",
            Self::MissingConfiguration(_) => "misconfiguration",
            Self::UploadFailure { .. } => "upload_failed",
            Self::RenderFailure { .. } => "render_failed",
            Self::Unhandled(_) => "unhandled_error",
        }
    }
}

pub type DocumentResult<T> = Result<T, DocumentError>;
