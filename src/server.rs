use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use relic_reporter::{track_requests, ClassifierBuilder, ConfigError, EndpointClassifier};

use crate::handlers;
use crate::AppState;

/// Endpoint buckets for the demo routes. More specific prefixes first.
pub fn endpoints() -> Result<EndpointClassifier, ConfigError> {
    let mut b = ClassifierBuilder::new();
    b.prefix("users", "/api/users")?
        .prefix("products", "/api/products")?
        .exact("health", "/health")?;
    b.build()
}

/// Builds the full Axum `Router` with all routes and the metrics middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    let reporter = state.reporter.clone();

    Router::new()
        // ── User endpoints ──────────────────────────────────────
        .route("/api/users/:id", get(handlers::users::get_user))
        .route("/api/users", post(handlers::users::create_user))
        // ── Product endpoints ───────────────────────────────────
        .route(
            "/api/products/:id",
            get(handlers::products::get_product),
        )
        .route("/health", get(|| async { "ok" }))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn_with_state(reporter, track_requests))
        .layer(CorsLayer::permissive())
}
