use docgen_core::error::DocumentError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

impl ApiGatewayResponse {
    pub fn with_location(mut self, location: &str) -> Self {
        if let Some(headers) = self.headers.as_object_mut() {
            headers.insert("Location".to_string(), Value::from(location));
        }
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(Value::as_str)
    }

    /// The decoded JSON body.
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

pub fn success_response(status_code: u16, payload: &impl Serialize) -> ApiGatewayResponse {
    match serde_json::to_string(payload) {
        Ok(body) => ApiGatewayResponse {
            status_code,
            headers: json!({"Content-Type": CONTENT_TYPE_JSON}),
            body,
        },
        Err(error) => error_response(&DocumentError::Unhandled(format!(
            "failed to serialize response: {error}"
        ))),
    }
}

/// The single place a [`DocumentError`] becomes an HTTP status.
pub fn error_response(error: &DocumentError) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code: error.status_code(),
        headers: json!({"Content-Type": CONTENT_TYPE_JSON}),
        body: json!({
            "error": error.error_code(),
            "message": error.to_string(),
        })
        .to_string(),
    }
}
