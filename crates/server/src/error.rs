use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use ebloodbank_gateway::GatewayError;
use ebloodbank_store::StoreError;

/// Errors that can occur when running the ebloodbank server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A gateway-level error surfaced through the API.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Authentication failed (missing or invalid credentials).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks permission for the requested operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl ServerError {
    /// HTTP status, client-facing message and offending field for this error.
    fn parts(&self) -> (StatusCode, String, Option<String>) {
        match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            Self::Config(_) | Self::Io(_) => internal(self),
            Self::Gateway(e) => match e {
                GatewayError::Validation(v) => {
                    (StatusCode::BAD_REQUEST, v.message.clone(), Some(v.field.clone()))
                }
                GatewayError::Transition(t) => (StatusCode::BAD_REQUEST, t.to_string(), None),
                GatewayError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
                GatewayError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string(), None),
                GatewayError::Store(StoreError::Duplicate(msg)) => {
                    (StatusCode::CONFLICT, format!("duplicate: {msg}"), None)
                }
                GatewayError::Store(_) | GatewayError::Configuration(_) => internal(self),
            },
        }
    }
}

/// Details of server-side failures stay in the logs.
fn internal(err: &ServerError) -> (StatusCode, String, Option<String>) {
    error!(error = %err, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error".to_owned(),
        None,
    )
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message, field) = self.parts();

        let body = if let Some(field) = field {
            serde_json::json!({ "error": message, "field": field })
        } else {
            serde_json::json!({ "error": message })
        };

        (status, axum::Json(body)).into_response()
    }
}
