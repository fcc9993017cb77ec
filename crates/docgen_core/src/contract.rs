//! Request contracts for the documents and resources endpoints.
//!
//! Events arrive as raw API Gateway proxy records. They are validated against a
//! JSON schema first and only then deserialized into the typed requests below,
//! so that schema failures carry a readable reason.

use std::sync::OnceLock;

use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::DocumentError;
use crate::storage_keys::{BucketIdentifierFormat, BucketSource};

pub const CREATE_METHOD: &str = "POST";
pub const LIST_METHOD: &str = "GET";
pub const BUCKET_ARN_PATTERN: &str = r"^arn:aws:s3:::[ a-zA-Z0-9!_.*'()-]+$";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathParameters {
    pub template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateQuery {
    #[serde(rename = "documentKey")]
    pub document_key: String,
    /// Absent when buckets come from the environment.
    #[serde(rename = "templateBucket", default)]
    pub template_bucket: Option<String>,
    #[serde(rename = "outputBucket", default)]
    pub output_bucket: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListQuery {
    #[serde(rename = "templateBucket", default)]
    pub template_bucket: Option<String>,
    #[serde(rename = "outputBucket", default)]
    pub output_bucket: Option<String>,
}

/// A validated create request. `body` still holds the raw JSON text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentRequest {
    #[serde(rename = "httpMethod")]
    pub http_method: String,
    #[serde(rename = "pathParameters")]
    pub path_parameters: PathParameters,
    #[serde(rename = "queryStringParameters")]
    pub query: CreateQuery,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListRequest {
    #[serde(rename = "httpMethod")]
    pub http_method: String,
    #[serde(rename = "queryStringParameters", default)]
    pub query: Option<ListQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateBucketListing {
    pub bucket_name: String,
    pub templates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputBucketListing {
    pub bucket_name: String,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceListing {
    pub template_buckets: Vec<TemplateBucketListing>,
    pub output_buckets: Vec<OutputBucketListing>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentCreatedResponse {
    pub status: String,
    pub bucket: String,
    pub key: String,
    pub location: String,
    pub sha256: String,
    pub generated_at: String,
}

/// Schema for create events. Bucket query parameters are required and
/// format-checked only when the request supplies the buckets.
pub fn create_schema(format: BucketIdentifierFormat, source: BucketSource) -> Value {
    let (bucket_property, required_query) = match (source, format) {
        (BucketSource::Environment, _) => (
            json!({"type": "string"}),
            json!(["documentKey"]),
        ),
        (BucketSource::Request, BucketIdentifierFormat::Arn) => (
            json!({"type": "string", "pattern": BUCKET_ARN_PATTERN}),
            json!(["documentKey", "templateBucket", "outputBucket"]),
        ),
        (BucketSource::Request, BucketIdentifierFormat::Name) => (
            json!({"type": "string", "minLength": 1}),
            json!(["documentKey", "templateBucket", "outputBucket"]),
        ),
    };

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Document Content",
        "description": "Content for a document",
        "type": "object",
        "required": ["httpMethod", "pathParameters", "queryStringParameters", "body"],
        "properties": {
            "httpMethod": {
                "description": "Endpoint only accepts POST method",
                "type": "string",
                "pattern": "^POST$",
            },
            "pathParameters": {
                "type": "object",
                "required": ["template"],
                "properties": {
                    "template": {"type": "string", "minLength": 1},
                },
            },
            "queryStringParameters": {
                "type": "object",
                "required": required_query,
                "properties": {
                    "documentKey": {"type": "string", "minLength": 1},
                    "templateBucket": bucket_property.clone(),
                    "outputBucket": bucket_property,
                },
            },
            "body": {
                "description": "Content for the template to render",
                "type": "string",
                "contentMediaType": "application/json",
            },
        },
    })
}

pub fn list_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Resource Request Content",
        "type": "object",
        "required": ["httpMethod"],
        "properties": {
            "httpMethod": {
                "description": "Endpoint only accepts GET method",
                "type": "string",
                "pattern": "^GET$",
            },
        },
    })
}

/// Creation intent is signalled by the POST method alone.
pub fn is_create_event(event: &Value) -> bool {
    event.get("httpMethod").and_then(Value::as_str) == Some(CREATE_METHOD)
}

pub fn validate_create_event(
    event: &Value,
    format: BucketIdentifierFormat,
    source: BucketSource,
) -> Result<DocumentRequest, DocumentError> {
    validate_against(create_validator(format, source)?, event)?;

    let request: DocumentRequest = serde_json::from_value(event.clone())
        .map_err(|error| DocumentError::SchemaValidation(format!("Malformed request: {error}")))?;

    // The schema only asserts a string; the body must also be parseable JSON.
    parse_content(&request.body)?;
    Ok(request)
}

pub fn validate_list_event(event: &Value) -> Result<ListRequest, DocumentError> {
    static LIST_VALIDATOR: CompiledSchema = OnceLock::new();
    validate_against(compiled(&LIST_VALIDATOR, list_schema)?, event)?;

    serde_json::from_value(event.clone())
        .map_err(|error| DocumentError::SchemaValidation(format!("Malformed request: {error}")))
}

pub fn parse_content(body: &str) -> Result<Value, DocumentError> {
    serde_json::from_str(body).map_err(|error| {
        DocumentError::SchemaValidation(format!("body must contain valid JSON: {error}"))
    })
}

type CompiledSchema = OnceLock<Result<Validator, String>>;

/// Schemas are compiled on first use and reused for the life of the process.
fn compiled(
    slot: &'static CompiledSchema,
    schema: fn() -> Value,
) -> Result<&'static Validator, DocumentError> {
    slot.get_or_init(|| jsonschema::validator_for(&schema()).map_err(|error| error.to_string()))
        .as_ref()
        .map_err(|reason| DocumentError::Unhandled(format!("invalid request schema: {reason}")))
}

fn create_validator(
    format: BucketIdentifierFormat,
    source: BucketSource,
) -> Result<&'static Validator, DocumentError> {
    static ARN_FROM_REQUEST: CompiledSchema = OnceLock::new();
    static NAME_FROM_REQUEST: CompiledSchema = OnceLock::new();
    static FROM_ENVIRONMENT: CompiledSchema = OnceLock::new();

    match (source, format) {
        (BucketSource::Request, BucketIdentifierFormat::Arn) => compiled(&ARN_FROM_REQUEST, || {
            create_schema(BucketIdentifierFormat::Arn, BucketSource::Request)
        }),
        (BucketSource::Request, BucketIdentifierFormat::Name) => {
            compiled(&NAME_FROM_REQUEST, || {
                create_schema(BucketIdentifierFormat::Name, BucketSource::Request)
            })
        }
        (BucketSource::Environment, _) => compiled(&FROM_ENVIRONMENT, || {
            create_schema(BucketIdentifierFormat::Arn, BucketSource::Environment)
        }),
    }
}

fn validate_against(validator: &Validator, event: &Value) -> Result<(), DocumentError> {
    let reasons: Vec<String> = validator
        .iter_errors(event)
        .map(|error| error.to_string())
        .collect();
    if reasons.is_empty() {
        Ok(())
    } else {
        Err(DocumentError::SchemaValidation(reasons.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_event() -> Value {
        json!({
            "httpMethod": "POST",
            "path": "/documents/blank_template_doc.docx",
            "pathParameters": {"template": "blank_template_doc.docx"},
            "queryStringParameters": {
                "documentKey": "documents/test.docx",
                "templateBucket": "arn:aws:s3:::stack-templates",
                "outputBucket": "arn:aws:s3:::stack-output",
            },
            "body": "{\"docket_number\": \"ABC-123US01\"}",
        })
    }

    #[test]
    fn accepts_well_formed_create_event() {
        let request = validate_create_event(
            &create_event(),
            BucketIdentifierFormat::Arn,
            BucketSource::Request,
        )
        .expect("event should validate");
        assert_eq!(request.path_parameters.template, "blank_template_doc.docx");
        assert_eq!(request.query.document_key, "documents/test.docx");
        assert_eq!(
            request.query.template_bucket.as_deref(),
            Some("arn:aws:s3:::stack-templates")
        );
    }

    #[test]
    fn environment_buckets_make_bucket_parameters_optional() {
        let mut event = create_event();
        let query = event["queryStringParameters"]
            .as_object_mut()
            .expect("query should be an object");
        query.remove("templateBucket");
        query.remove("outputBucket");

        let request =
            validate_create_event(&event, BucketIdentifierFormat::Arn, BucketSource::Environment)
                .expect("bucket parameters are optional");
        assert_eq!(request.query.template_bucket, None);
        assert_eq!(request.query.output_bucket, None);

        let error =
            validate_create_event(&event, BucketIdentifierFormat::Arn, BucketSource::Request)
                .expect_err("request-sourced buckets are required");
        assert!(error.to_string().contains("templateBucket"));
        assert!(error.to_string().contains("outputBucket"));
    }

    #[test]
    fn environment_mode_still_requires_document_key() {
        let mut event = create_event();
        event["queryStringParameters"] = json!({});

        let error =
            validate_create_event(&event, BucketIdentifierFormat::Arn, BucketSource::Environment)
                .expect_err("documentKey is always required");
        assert!(error.to_string().contains("documentKey"));
    }

    #[test]
    fn validators_are_compiled_once() {
        let first = create_validator(BucketIdentifierFormat::Name, BucketSource::Request)
            .expect("schema should compile");
        let second = create_validator(BucketIdentifierFormat::Name, BucketSource::Request)
            .expect("schema should compile");
        assert!(std::ptr::eq(first, second));

        let arn = create_validator(BucketIdentifierFormat::Arn, BucketSource::Request)
            .expect("schema should compile");
        assert!(!std::ptr::eq(first, arn));
    }

    #[test]
    fn rejects_missing_document_key() {
        let mut event = create_event();
        event["queryStringParameters"]
            .as_object_mut()
            .expect("query should be an object")
            .remove("documentKey");

        let error =
            validate_create_event(&event, BucketIdentifierFormat::Arn, BucketSource::Request)
                .expect_err("missing key should fail");
        assert_eq!(error.status_code(), 400);
        assert!(error.to_string().contains("Failed schema validation"));
        assert!(error.to_string().contains("documentKey"));
    }

    #[test]
    fn rejects_body_that_is_not_json() {
        let mut event = create_event();
        event["body"] = Value::from("docket_number=ABC");

        let error =
            validate_create_event(&event, BucketIdentifierFormat::Arn, BucketSource::Request)
                .expect_err("non-JSON body should fail");
        assert!(error.to_string().contains("Failed schema validation"));
    }

    #[test]
    fn rejects_bare_bucket_names_in_arn_mode() {
        let mut event = create_event();
        event["queryStringParameters"]["templateBucket"] = Value::from("stack-templates");

        assert!(
            validate_create_event(&event, BucketIdentifierFormat::Arn, BucketSource::Request)
                .is_err()
        );
        let mut named = event.clone();
        named["queryStringParameters"]["outputBucket"] = Value::from("stack-output");
        assert!(
            validate_create_event(&named, BucketIdentifierFormat::Name, BucketSource::Request)
                .is_ok()
        );
    }

    #[test]
    fn list_schema_requires_get() {
        assert!(validate_list_event(&json!({"httpMethod": "GET"})).is_ok());
        assert!(validate_list_event(&json!({"httpMethod": "DELETE"})).is_err());
        assert!(validate_list_event(&json!({})).is_err());
    }

    #[test]
    fn list_event_tolerates_null_query() {
        let request = validate_list_event(&json!({
            "httpMethod": "GET",
            "queryStringParameters": null,
        }))
        .expect("null query should be accepted");
        assert_eq!(request.query, None);
    }

    #[test]
    fn detects_create_intent_from_method() {
        assert!(is_create_event(&create_event()));
        assert!(!is_create_event(&json!({"httpMethod": "GET"})));
        assert!(!is_create_event(&json!({"body": "{}"})));
    }
}
