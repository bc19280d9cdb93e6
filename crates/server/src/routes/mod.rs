//! HTTP routes.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                - Liveness
//! GET    /health/ready                          - Readiness (catalog store reachable)
//!
//! # Stores (requires identity)
//! POST   /api/v1/store/add                      - Create store
//! GET    /api/v1/store/list                     - List own stores
//! PATCH  /api/v1/store/update/{store_id}        - Patch store
//! DELETE /api/v1/store/remove/{store_id}        - Delete store and its items
//! GET    /api/v1/store/view/{store_id}          - Store with items
//!
//! # Items (requires identity)
//! POST   /api/v1/item/add/{store_id}            - Create item
//! GET    /api/v1/item/view/{store_id}/{item_id} - Single item
//! PATCH  /api/v1/item/update/{store_id}/{item_id}
//! DELETE /api/v1/item/remove/{store_id}/{item_id}
//! ```

pub mod extract;
pub mod items;
pub mod stores;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware as axum_middleware,
    routing::get,
};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::{cors_layer, request_id_middleware};
use crate::state::AppState;

/// Routes under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/store", stores::router())
        .nest("/item", items::router())
}

/// Build the full application router with its middleware stack.
///
/// Generic over the session store so tests can run against
/// `tower_sessions::MemoryStore`.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let cors = cors_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/v1", api_routes())
        .layer(session_layer)
        .layer(cors)
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the catalog store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.inventory().health_check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
