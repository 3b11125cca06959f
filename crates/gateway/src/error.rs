//! Gateway error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Gateway-specific errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// CORS origin is not a valid header value
    #[error("invalid CORS origin '{origin}'")]
    InvalidOrigin { origin: String },

    /// Server loop failed
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    /// Client exceeded its request budget
    #[error("rate limit exceeded")]
    RateLimited,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match self {
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
