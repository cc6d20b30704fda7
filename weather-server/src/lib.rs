//! HTTP API over saved weather queries.
//!
//! Routes live under `/api`; see [`routes::router`].

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use weather_core::QueryService;

pub mod error;
pub mod routes;

pub use routes::AppState;

pub const API_PREFIX: &str = "/api";

/// Build the full application: API routes, health check, CORS and request tracing.
pub fn app(service: QueryService, allowed_origin: &str) -> Result<Router> {
    let origin: HeaderValue = allowed_origin
        .parse()
        .with_context(|| format!("Invalid ALLOWED_ORIGIN '{allowed_origin}'"))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true);

    Ok(Router::new()
        .route("/health", get(health))
        .nest(API_PREFIX, routes::router())
        .with_state(AppState { service })
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

async fn health() -> &'static str {
    "ok"
}
