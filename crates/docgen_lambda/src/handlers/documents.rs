use docgen_core::contract::{
    is_create_event, parse_content, validate_create_event, validate_list_event,
    DocumentCreatedResponse, DocumentRequest, ResourceListing,
};
use docgen_core::error::{DocumentError, DocumentResult};
use docgen_core::render::{content_digest, DocumentRenderer};
use docgen_core::storage_keys::{
    object_location_url, resolve_bucket_name, template_key, StorageLocation,
};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::adapters::object_store::{ObjectStore, StorageError, StorageErrorKind};
use crate::adapters::scratch::RenderJob;
use crate::config::{BucketSource, HandlerConfig};
use crate::handlers::listing::build_listing;
use crate::handlers::response::{error_response, success_response, ApiGatewayResponse};

const COMPONENT: &str = "documents_handler";

/// Entry point for `/documents/{template}`.
///
/// A POST renders a document; any other method lists the template and output
/// buckets. Every outcome, including failures, is returned as a response.
pub fn handle_documents_event(
    event: Value,
    config: &HandlerConfig,
    store: &impl ObjectStore,
    renderer: &impl DocumentRenderer,
) -> ApiGatewayResponse {
    debug!(component = COMPONENT, event = %event, "event_received");

    let result = if is_create_event(&event) {
        create_document(&event, config, store, renderer).map(|created| {
            success_response(201, &created).with_location(&created.location)
        })
    } else {
        list_documents(&event, config, store).map(|listing| success_response(200, &listing))
    };

    result.unwrap_or_else(|failure| {
        error!(
            component = COMPONENT,
            status_code = failure.status_code(),
            error_code = failure.error_code(),
            error = %failure,
            "request_failed"
        );
        error_response(&failure)
    })
}

fn create_document(
    event: &Value,
    config: &HandlerConfig,
    store: &impl ObjectStore,
    renderer: &impl DocumentRenderer,
) -> DocumentResult<DocumentCreatedResponse> {
    let request = validate_create_event(event, config.bucket_format, config.bucket_source)?;
    let (template_bucket, output_bucket) = resolve_create_buckets(&request, config)?;
    let region = config.region()?;

    let template_location =
        StorageLocation::new(template_bucket, template_key(&request.path_parameters.template));
    let output_location = StorageLocation::new(output_bucket, request.query.document_key.clone());

    let job = RenderJob::new(&config.scratch_dir, parse_content(&request.body)?);

    fetch_template(store, &template_location, &job)?;
    render_document(renderer, &template_location, &job)?;

    let document = job.read_document().map_err(DocumentError::Unhandled)?;
    upload_document(store, &output_location, &document)?;
    job.cleanup();

    Ok(DocumentCreatedResponse {
        status: "OK".to_string(),
        location: object_location_url(&output_location.bucket, region, &output_location.key),
        bucket: output_location.bucket,
        key: output_location.key,
        sha256: content_digest(&document),
        generated_at: chrono::Utc::now().to_rfc3339(),
    })
}

fn resolve_create_buckets(
    request: &DocumentRequest,
    config: &HandlerConfig,
) -> DocumentResult<(String, String)> {
    match config.bucket_source {
        BucketSource::Request => Ok((
            query_bucket(request.query.template_bucket.as_deref(), "templateBucket", config)?,
            query_bucket(request.query.output_bucket.as_deref(), "outputBucket", config)?,
        )),
        BucketSource::Environment => Ok((
            config.configured_template_bucket()?.to_string(),
            config.configured_output_bucket()?.to_string(),
        )),
    }
}

fn query_bucket(raw: Option<&str>, name: &str, config: &HandlerConfig) -> DocumentResult<String> {
    let raw = raw.ok_or_else(|| {
        DocumentError::SchemaValidation(format!("\"{name}\" is a required property"))
    })?;
    resolve_bucket_name(raw, config.bucket_format)
}

fn fetch_template(
    store: &impl ObjectStore,
    location: &StorageLocation,
    job: &RenderJob,
) -> DocumentResult<()> {
    let exists = store
        .object_exists(location)
        .map_err(|failure| template_fetch_error(failure, location))?;
    if !exists {
        return Err(DocumentError::TemplateNotFound {
            bucket: location.bucket.clone(),
            key: location.key.clone(),
        });
    }

    let template = store
        .get_object(location)
        .map_err(|failure| template_fetch_error(failure, location))?;
    job.write_template(&template)
        .map_err(DocumentError::Unhandled)?;

    info!(
        component = COMPONENT,
        bucket = %location.bucket,
        key = %location.key,
        bytes = template.len(),
        "template_fetched"
    );
    Ok(())
}

fn template_fetch_error(failure: StorageError, location: &StorageLocation) -> DocumentError {
    match failure.kind {
        StorageErrorKind::NotFound => DocumentError::TemplateNotFound {
            bucket: location.bucket.clone(),
            key: location.key.clone(),
        },
        StorageErrorKind::BucketUnavailable => DocumentError::BucketUnavailable {
            bucket: location.bucket.clone(),
            key: location.key.clone(),
        },
        StorageErrorKind::Other => DocumentError::Unhandled(failure.message),
    }
}

fn render_document(
    renderer: &impl DocumentRenderer,
    template_location: &StorageLocation,
    job: &RenderJob,
) -> DocumentResult<()> {
    let template = job.read_template().map_err(DocumentError::Unhandled)?;
    let rendered =
        renderer
            .render(&template, &job.content)
            .map_err(|failure| DocumentError::RenderFailure {
                template: template_location.key.clone(),
                reason: failure.message().to_string(),
            })?;
    job.write_document(&rendered)
        .map_err(DocumentError::Unhandled)?;

    info!(
        component = COMPONENT,
        template = %template_location.key,
        content = %job.content,
        "document_rendered"
    );
    Ok(())
}

fn upload_document(
    store: &impl ObjectStore,
    location: &StorageLocation,
    document: &[u8],
) -> DocumentResult<()> {
    store.put_object(location, document).map_err(|failure| {
        error!(
            component = COMPONENT,
            bucket = %location.bucket,
            key = %location.key,
            error = %failure,
            "upload_failed"
        );
        DocumentError::UploadFailure {
            bucket: location.bucket.clone(),
            key: location.key.clone(),
        }
    })?;

    info!(
        component = COMPONENT,
        bucket = %location.bucket,
        key = %location.key,
        "document_stored"
    );
    Ok(())
}

fn list_documents(
    event: &Value,
    config: &HandlerConfig,
    store: &impl ObjectStore,
) -> DocumentResult<ResourceListing> {
    let request = validate_list_event(event)?;
    let query = request.query.unwrap_or_default();

    let (template_bucket, output_bucket) = match config.bucket_source {
        BucketSource::Request => {
            let template_bucket = match query.template_bucket.as_deref() {
                Some(raw) => resolve_bucket_name(raw, config.bucket_format)?,
                None => config.configured_template_bucket()?.to_string(),
            };
            let output_bucket = match query.output_bucket.as_deref() {
                Some(raw) => Some(resolve_bucket_name(raw, config.bucket_format)?),
                None => config.output_bucket.clone(),
            };
            (template_bucket, output_bucket)
        }
        BucketSource::Environment => (
            config.configured_template_bucket()?.to_string(),
            config.output_bucket.clone(),
        ),
    };

    build_listing(COMPONENT, store, &template_bucket, output_bucket.as_deref())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use docgen_core::render::RenderError;

    use super::*;
    use crate::adapters::memory::MemoryObjectStore;

    struct EchoRenderer;

    impl DocumentRenderer for EchoRenderer {
        fn render(&self, template: &[u8], content: &Value) -> Result<Vec<u8>, RenderError> {
            let mut rendered = template.to_vec();
            rendered.extend_from_slice(content.to_string().as_bytes());
            Ok(rendered)
        }
    }

    struct FailingRenderer;

    impl DocumentRenderer for FailingRenderer {
        fn render(&self, _template: &[u8], _content: &Value) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::new("unexpected '}}'"))
        }
    }

    fn sample_config(scratch: &std::path::Path) -> HandlerConfig {
        HandlerConfig {
            region: Some("us-east-1".to_string()),
            scratch_dir: scratch.to_path_buf(),
            ..HandlerConfig::default()
        }
    }

    fn create_event(template: &str, document_key: &str) -> Value {
        json!({
            "httpMethod": "POST",
            "pathParameters": {"template": template},
            "queryStringParameters": {
                "documentKey": document_key,
                "templateBucket": "arn:aws:s3:::templates",
                "outputBucket": "arn:aws:s3:::output",
            },
            "body": "{\"docket_number\": \"ABC-123US01\"}",
        })
    }

    fn seeded_store() -> MemoryObjectStore {
        let store = MemoryObjectStore::with_buckets(["templates", "output"]);
        store.seed_object("templates", "documents/blank.docx", b"TEMPLATE:");
        store
    }

    #[test]
    fn create_writes_rendered_document_and_cleans_scratch() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let store = seeded_store();

        let response = handle_documents_event(
            create_event("blank.docx", "documents/out.docx"),
            &sample_config(scratch.path()),
            &store,
            &EchoRenderer,
        );

        assert_eq!(response.status_code, 201);
        assert_eq!(
            response.header("Location"),
            Some("https://output.s3.us-east-1.amazonaws.com/documents/out.docx")
        );
        let written = store
            .object("output", "documents/out.docx")
            .expect("document should be stored");
        assert!(written.starts_with(b"TEMPLATE:"));
        assert!(String::from_utf8_lossy(&written).contains("ABC-123US01"));
        let body = response.json_body().expect("body should be JSON");
        assert_eq!(body["status"], "OK");
        assert_eq!(body["sha256"], content_digest(&written));
        assert_eq!(
            std::fs::read_dir(scratch.path()).expect("scratch dir").count(),
            0
        );
    }

    #[test]
    fn render_failure_is_500_and_writes_nothing() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let store = seeded_store();

        let response = handle_documents_event(
            create_event("blank.docx", "documents/out.docx"),
            &sample_config(scratch.path()),
            &store,
            &FailingRenderer,
        );

        assert_eq!(response.status_code, 500);
        let body = response.json_body().expect("body should be JSON");
        assert_eq!(body["error"], "render_failed");
        assert!(body["message"]
            .as_str()
            .expect("message")
            .contains("documents/blank.docx"));
        assert!(store.keys("output").is_empty());
    }

    #[test]
    fn missing_region_is_misconfiguration() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let config = HandlerConfig {
            region: None,
            ..sample_config(scratch.path())
        };

        let response = handle_documents_event(
            create_event("blank.docx", "documents/out.docx"),
            &config,
            &seeded_store(),
            &EchoRenderer,
        );

        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("Missing env AWS_REGION"));
    }

    #[test]
    fn environment_buckets_override_query_parameters() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let store = MemoryObjectStore::with_buckets(["env-templates", "env-output"]);
        store.seed_object("env-templates", "documents/blank.docx", b"T");
        let config = HandlerConfig {
            bucket_source: BucketSource::Environment,
            template_bucket: Some("env-templates".to_string()),
            output_bucket: Some("env-output".to_string()),
            ..sample_config(scratch.path())
        };

        let response = handle_documents_event(
            create_event("blank.docx", "documents/out.docx"),
            &config,
            &store,
            &EchoRenderer,
        );

        assert_eq!(response.status_code, 201);
        assert!(store.object("env-output", "documents/out.docx").is_some());
    }

    #[test]
    fn environment_buckets_need_no_query_parameters() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let store = MemoryObjectStore::with_buckets(["env-templates", "env-output"]);
        store.seed_object("env-templates", "documents/blank.docx", b"T");
        let config = HandlerConfig {
            bucket_source: BucketSource::Environment,
            template_bucket: Some("env-templates".to_string()),
            output_bucket: Some("env-output".to_string()),
            ..sample_config(scratch.path())
        };
        let event = json!({
            "httpMethod": "POST",
            "pathParameters": {"template": "blank.docx"},
            "queryStringParameters": {"documentKey": "documents/out.docx"},
            "body": "{\"docket_number\": \"ABC-1\"}",
        });

        let response = handle_documents_event(event, &config, &store, &EchoRenderer);

        assert_eq!(response.status_code, 201);
        assert_eq!(
            response.header("Location"),
            Some("https://env-output.s3.us-east-1.amazonaws.com/documents/out.docx")
        );
        assert!(store.object("env-output", "documents/out.docx").is_some());
    }

    #[test]
    fn environment_source_without_output_bucket_is_500() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let config = HandlerConfig {
            bucket_source: BucketSource::Environment,
            template_bucket: Some("templates".to_string()),
            ..sample_config(scratch.path())
        };

        let response = handle_documents_event(
            create_event("blank.docx", "documents/out.docx"),
            &config,
            &seeded_store(),
            &EchoRenderer,
        );

        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("Missing env OUTPUT_BUCKET"));
    }

    #[test]
    fn unclassified_storage_fault_is_passed_through() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let store = seeded_store();
        store.fail_all("templates");

        let response = handle_documents_event(
            create_event("blank.docx", "documents/out.docx"),
            &sample_config(scratch.path()),
            &store,
            &EchoRenderer,
        );

        assert_eq!(response.status_code, 500);
        let body = response.json_body().expect("body should be JSON");
        assert_eq!(body["error"], "unhandled_error");
        assert!(body["message"]
            .as_str()
            .expect("message")
            .starts_with("Unhandled Server Error: simulated storage fault"));
    }

    #[test]
    fn list_falls_back_to_configured_buckets() {
        let store = seeded_store();
        store.seed_object("output", "documents/old.docx", b"x");
        let config = HandlerConfig {
            template_bucket: Some("templates".to_string()),
            output_bucket: Some("output".to_string()),
            ..HandlerConfig::default()
        };

        let response =
            handle_documents_event(json!({"httpMethod": "GET"}), &config, &store, &EchoRenderer);

        assert_eq!(response.status_code, 200);
        let listing: ResourceListing =
            serde_json::from_str(&response.body).expect("listing should parse");
        assert_eq!(
            listing.template_buckets[0].templates,
            vec!["documents/blank.docx".to_string()]
        );
        assert_eq!(
            listing.output_buckets[0].documents,
            vec!["documents/old.docx".to_string()]
        );
    }

    #[test]
    fn list_without_any_template_bucket_is_500() {
        let response = handle_documents_event(
            json!({"httpMethod": "GET"}),
            &HandlerConfig::default(),
            &seeded_store(),
            &EchoRenderer,
        );

        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("Missing env TEMPLATES_BUCKET"));
    }
}
