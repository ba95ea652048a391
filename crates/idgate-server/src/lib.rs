//! IdGate server: HTTP surface, configuration and process bootstrap.
//!
//! The gateway federates application identity with an external identity
//! provider, issues its own session credentials, and enriches them with
//! authorization data from PostgreSQL. This crate wires the bridge, minter,
//! cookie transport and enrichment into an axum router.

pub mod config;
pub mod error;
pub mod handlers;
pub mod observability;
pub mod pipeline;
pub mod state;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;
use crate::state::AppState;

/// Builds the complete application router with tracing and CORS layers.
pub fn app(state: AppState, cors: &CorsConfig) -> Router {
    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors_layer = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    handlers::router(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}
