//! # Gateway
//!
//! HTTP front of the relay.
//!
//! | Route | Method | Response |
//! |---|---|---|
//! | `/wh/{source}` | POST | `200 {}` |
//! | `/messages/{source}` | GET | `200` JSON array, FIFO order |
//!
//! Layers, outermost first: request tracing, CORS, per-client rate limiting.

mod error;
mod handlers;
mod rate_limit;

pub use error::GatewayError;
pub use rate_limit::{RateLimiter, UNKNOWN_CLIENT};

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use contracts::{CorsConfig, DrainFormat, RelayConfig};
use dispatcher::RelayHandle;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub relay: RelayHandle,
    pub drain_format: DrainFormat,
}

/// Build the full router for `relay` from configuration.
///
/// # Errors
/// A configured CORS origin is not a valid header value.
pub fn router(relay: RelayHandle, config: &RelayConfig) -> Result<Router, GatewayError> {
    let state = AppState {
        relay,
        drain_format: config.queue.drain_format,
    };
    let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
    let cors = cors_layer(&config.server.cors)?;

    Ok(Router::new()
        .route("/wh/{source}", post(handlers::ingest))
        .route("/messages/{source}", get(handlers::drain))
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .layer(middleware::from_fn_with_state(limiter, rate_limit::throttle))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// CORS policy: configured origins, GET/POST, Origin/Content-Type/Accept headers.
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, GatewayError> {
    let allow_origin = if config.allow_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins = config
            .allow_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| GatewayError::InvalidOrigin {
                    origin: origin.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT]))
}

/// Bind the configured listen address.
pub async fn bind(addr: &str) -> Result<TcpListener, GatewayError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| GatewayError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Serve `router` until `shutdown` resolves.
///
/// Peer addresses are recorded so rate limiting can key on client IP.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<(), GatewayError>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = ?listener.local_addr().ok(), "Gateway listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    info!("Gateway stopped");
    Ok(())
}
