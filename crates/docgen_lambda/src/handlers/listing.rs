use docgen_core::contract::{OutputBucketListing, ResourceListing, TemplateBucketListing};
use docgen_core::error::DocumentError;
use tracing::info;

use crate::adapters::object_store::ObjectStore;

/// Lists the template bucket and, when given, the output bucket.
pub(crate) fn build_listing(
    component: &'static str,
    store: &impl ObjectStore,
    template_bucket: &str,
    output_bucket: Option<&str>,
) -> Result<ResourceListing, DocumentError> {
    let templates = store
        .list_keys(template_bucket)
        .map_err(|error| DocumentError::Unhandled(error.message))?;
    info!(
        component,
        bucket = template_bucket,
        count = templates.len(),
        "templates_listed"
    );

    let mut listing = ResourceListing {
        template_buckets: vec![TemplateBucketListing {
            bucket_name: template_bucket.to_string(),
            templates,
        }],
        output_buckets: Vec::new(),
    };

    if let Some(output_bucket) = output_bucket {
        let documents = store
            .list_keys(output_bucket)
            .map_err(|error| DocumentError::Unhandled(error.message))?;
        info!(
            component,
            bucket = output_bucket,
            count = documents.len(),
            "documents_listed"
        );
        listing.output_buckets.push(OutputBucketListing {
            bucket_name: output_bucket.to_string(),
            documents,
        });
    }

    Ok(listing)
}
