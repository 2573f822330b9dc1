pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Stateless validation
        .route("/api/v1/validate", post(handlers::handle_validate))
        .route("/api/v1/validation/rules", get(handlers::handle_rule_catalog))
        // Document sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/source",
            put(handlers::handle_put_source).delete(handlers::handle_delete_source),
        )
        .route("/api/v1/sessions/:id/process", post(handlers::handle_process))
        .route(
            "/api/v1/sessions/:id/edits",
            get(handlers::handle_get_edits).post(handlers::handle_save_edits),
        )
        .route(
            "/api/v1/sessions/:id/appendix",
            put(handlers::handle_put_appendix).delete(handlers::handle_delete_appendix),
        )
        .route("/api/v1/sessions/:id/render", post(handlers::handle_render))
        .route(
            "/api/v1/sessions/:id/document",
            get(handlers::handle_download_document),
        )
        .route(
            "/api/v1/sessions/:id/record",
            get(handlers::handle_download_record),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}
