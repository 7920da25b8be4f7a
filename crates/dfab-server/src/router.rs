use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::tools;

/// Build the axum router with all DocFabric endpoints.
pub fn build_router(state: AppState) -> Router {
    let max_upload = state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/documents",
            get(handlers::list_documents).post(handlers::create_document),
        )
        .route(
            "/api/documents/:id",
            get(handlers::get_document)
                .put(handlers::update_document)
                .delete(handlers::delete_document),
        )
        .route("/api/documents/:id/content", get(handlers::get_content))
        .route("/api/documents/:id/outline", get(handlers::get_outline))
        .route("/api/documents/:id/original", get(handlers::get_original))
        .route("/tools", get(tools::list_tools))
        .route("/tools/:name", post(tools::call_tool))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
