use docgen_core::contract::{validate_list_event, ResourceListing};
use docgen_core::error::DocumentResult;
use serde_json::Value;
use tracing::{debug, error};

use crate::adapters::object_store::ObjectStore;
use crate::config::HandlerConfig;
use crate::handlers::listing::build_listing;
use crate::handlers::response::{error_response, success_response, ApiGatewayResponse};

const COMPONENT: &str = "resources_handler";

/// Entry point for `GET /resources`: lists the buckets named in configuration.
pub fn handle_resources_event(
    event: Value,
    config: &HandlerConfig,
    store: &impl ObjectStore,
) -> ApiGatewayResponse {
    debug!(component = COMPONENT, event = %event, "event_received");

    match list_resources(&event, config, store) {
        Ok(listing) => success_response(200, &listing),
        Err(failure) => {
            error!(
                component = COMPONENT,
                status_code = failure.status_code(),
                error = %failure,
                "request_failed"
            );
            error_response(&failure)
        }
    }
}

fn list_resources(
    event: &Value,
    config: &HandlerConfig,
    store: &impl ObjectStore,
) -> DocumentResult<ResourceListing> {
    validate_list_event(event)?;
    let template_bucket = config.configured_template_bucket()?;
    let output_bucket = config.configured_output_bucket()?;

    build_listing(COMPONENT, store, template_bucket, Some(output_bucket))
}
