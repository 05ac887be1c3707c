//! Route configuration and setup

use crate::auth::middleware::auth_middleware;
use crate::handlers;
use crate::middleware::{security_headers_middleware, SecurityHeadersConfig};
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use pictura_core::Config;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router {
    let body_limit = config.max_file_size_bytes() + MULTIPART_OVERHEAD_BYTES;

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/authorize", get(handlers::auth::authorize))
        .route("/oauth2callback", get(handlers::auth::oauth2callback))
        .route("/logout", get(handlers::auth::logout));

    let mut protected_routes = Router::new()
        .route(
            "/",
            get(handlers::index::index_page).post(handlers::index::upload),
        )
        .route("/files/{name}", get(handlers::files::get_file))
        .route(
            "/image_details/{name}",
            get(handlers::image_details::get_image_details),
        );

    if let Some(gate) = state.auth.clone() {
        protected_routes =
            protected_routes.layer(axum::middleware::from_fn_with_state(gate, auth_middleware));
    }

    let security_headers_config = Arc::new(SecurityHeadersConfig::new(config.is_production()));

    public_routes
        .merge(protected_routes)
        // Bodies over the upload limit fail while the multipart stream is
        // read, which the upload handler turns into a flash message. The
        // outer layer is a hard cap for anything far larger.
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit * 2))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            security_headers_config,
            security_headers_middleware,
        ))
        .with_state(state)
}
