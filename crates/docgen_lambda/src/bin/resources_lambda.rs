use docgen_lambda::adapters::s3::S3ObjectStore;
use docgen_lambda::config::HandlerConfig;
use docgen_lambda::handlers::resources::handle_resources_event;
use docgen_lambda::handlers::response::ApiGatewayResponse;
use docgen_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct RuntimeDependencies {
    config: HandlerConfig,
    store: S3ObjectStore,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<ApiGatewayResponse, Error> {
    Ok(handle_resources_event(
        event.payload,
        &deps.config,
        &deps.store,
    ))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        config: HandlerConfig::from_env()?,
        store: S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config)),
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &deps))).await
}
