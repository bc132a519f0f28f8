//! API route definitions

use std::time::Duration;

use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::handlers::AppState;

/// Create the `/api` router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/generate-flashcards", post(handlers::generate_flashcards))
        .with_state(state)
}

/// Full application router with middleware
pub fn build_router(state: AppState, enable_cors: bool) -> Router {
    // Covers the time until response headers; the body has its own deadline
    let header_timeout = state.max_duration.max(Duration::from_secs(1));

    let mut app = Router::new().nest("/api", api_routes(state)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(header_timeout)),
    );

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}
