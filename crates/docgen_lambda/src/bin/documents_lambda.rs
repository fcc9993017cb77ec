use docgen_core::render::DocxRenderer;
use docgen_lambda::adapters::s3::S3ObjectStore;
use docgen_lambda::config::HandlerConfig;
use docgen_lambda::handlers::documents::handle_documents_event;
use docgen_lambda::handlers::response::ApiGatewayResponse;
use docgen_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::info;

struct RuntimeDependencies {
    config: HandlerConfig,
    store: S3ObjectStore,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<ApiGatewayResponse, Error> {
    info!(request_id = %event.context.request_id, "invocation_started");
    Ok(handle_documents_event(
        event.payload,
        &deps.config,
        &deps.store,
        &DocxRenderer,
    ))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = HandlerConfig::from_env()?;
    info!(
        bucket_source = ?config.bucket_source,
        bucket_format = ?config.bucket_format,
        scratch_dir = %config.scratch_dir.display(),
        "documents_lambda_configured"
    );

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        config,
        store: S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config)),
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &deps))).await
}
