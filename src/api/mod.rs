//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the TechMatch
//! marketplace. It includes:
//! - Registration and session endpoints
//! - Patent listing endpoints (public reads, owner-scoped writes)
//! - Interest endpoints for buyers and sellers
//! - Direct message endpoints
//! - Editorial content endpoints (columns and interviews)
//! - Admin endpoints for listing moderation and article management
//! - Uploaded image serving

pub mod admin;
pub mod articles;
pub mod auth;
pub mod content;
pub mod interests;
pub mod messages;
pub mod middleware;
pub mod patents;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

pub use middleware::{ApiError, AppState, CurrentIdentity, OptionalIdentity};

/// GET /api/ping - Liveness probe
async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "time": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need an authenticated admin account)
    let admin_routes = Router::new()
        .nest("/admin", admin::router())
        .nest("/admin/articles", articles::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = Router::new()
        .merge(auth::protected_router())
        .route("/patents", post(patents::create_patent))
        .route("/patents/{id}", put(patents::update_patent))
        .route("/patents/{id}", delete(patents::delete_patent))
        .route(
            "/patents/{id}/interests",
            get(interests::list_patent_interests),
        )
        .route("/user/patents", get(patents::list_owned_patents))
        .route(
            "/user/interests",
            get(interests::list_my_interests_with_patents),
        )
        .route("/interests", post(interests::create_interest))
        .route("/my-interests", get(interests::list_my_interests))
        .route("/patent-interests", get(interests::list_received_interests))
        .route("/messages", post(messages::create_message))
        .route("/messages", get(messages::list_messages))
        .route("/messages/{id}/read", put(messages::mark_message_read))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Listing reads are public; a session only widens the scope they may ask for
    let patent_reads = Router::new()
        .route("/patents", get(patents::list_patents))
        .route("/patents/{id}", get(patents::get_patent))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ));

    // Public routes
    Router::new()
        .route("/ping", get(ping))
        .merge(auth::public_router())
        .merge(content::router())
        .merge(patent_reads)
        .merge(admin_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    // CORS is pinned to the configured frontend origin; credentials stay
    // enabled for the cookie session.
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .server
                .cors_origin
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .nest_service("/uploads", ServeDir::new(&state.config.upload.path))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
