//! Ingest and drain handlers

use axum::{
    extract::{rejection::BytesRejection, Path, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::json;
use tracing::{error, warn};

use contracts::{DrainFormat, Message};

use crate::AppState;

/// `POST /wh/{source}`
///
/// Answers `200 {}`: whether the message is kept or dropped is decided later
/// by the dispatcher. An unreadable body is submitted as empty. Bodies over
/// the configured limit are refused with 413 and never submitted.
pub async fn ingest(
    State(state): State<AppState>,
    Path(source): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let bytes = match body {
        Ok(bytes) => bytes,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!(source = %source, "Request body over limit, rejected");
            return rejection.into_response();
        }
        Err(rejection) => {
            warn!(source = %source, error = %rejection, "Failed to read request body, submitting empty payload");
            Bytes::new()
        }
    };

    if let Err(e) = state.relay.submit(source, bytes) {
        error!(error = %e, "Payload not accepted");
    }

    Json(json!({})).into_response()
}

/// `GET /messages/{source}`
///
/// Drains the source's queue and returns its messages in FIFO order; `[]`
/// for unknown or empty sources.
pub async fn drain(State(state): State<AppState>, Path(source): Path<String>) -> Response {
    let messages = state.relay.drain(&source);

    match state.drain_format {
        DrainFormat::Strings => Json(messages).into_response(),
        DrainFormat::Raw => (
            [(CONTENT_TYPE, "application/json")],
            splice_raw(&messages),
        )
            .into_response(),
    }
}

/// Join messages that are already JSON documents into one JSON array.
fn splice_raw(messages: &[Message]) -> String {
    let body_len: usize = messages.iter().map(|m| m.len() + 1).sum();
    let mut out = String::with_capacity(body_len + 2);

    out.push('[');
    for (idx, message) in messages.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(message.as_str());
    }
    out.push(']');
    out
}
