//! HTTP API route definitions.

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::handlers::{
    get_bookmakers, get_live, get_metrics, get_odds, get_regions, get_snapshots, get_sports,
    health, AppState,
};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_allow_origin.as_deref());

    Router::new()
        // Health and metrics
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
        // Opportunities
        .route("/api/odds", get(get_odds))
        .route("/api/live", get(get_live))
        // Reference data
        .route("/api/sports", get(get_sports))
        .route("/api/regions", get(get_regions))
        .route("/api/bookmakers", get(get_bookmakers))
        .route("/api/snapshots", get(get_snapshots))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Any origin unless one is configured.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin.map(str::trim).filter(|o| !o.is_empty() && *o != "*") {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Invalid CORS origin, allowing any");
                AllowOrigin::any()
            }
        },
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
