pub mod directories;
pub mod extract;
pub mod files;
pub mod health;
pub mod insights;

use axum::routing::{get, post};
use axum::Router;
use http::HeaderValue;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::IdentityLayer;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_upload = state.config.max_upload_size as usize;

    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route("/blobs/{key}", get(files::download_blob));

    // Handlers that need an identity extract `Principal` themselves.
    let api_routes = Router::new()
        .route("/status", get(health::status))
        .route("/root-dir", get(directories::get_root))
        .route("/directory/create", post(directories::create_directory))
        .route("/directory/access", post(directories::record_access))
        .route("/directory/most-accessed", get(directories::most_accessed))
        .route("/directory/{directory_id}", get(directories::get_contents))
        .route(
            "/directory/{directory_id}/files/{*filename}",
            post(files::upload_file),
        )
        .route("/file/register", post(files::register_file))
        .route("/insights", get(insights::get_insights));

    let x_request_id = http::HeaderName::from_static("x-request-id");

    Router::new()
        .merge(public_routes)
        .nest("/api", api_routes)
        .layer(IdentityLayer::new())
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config.cors_allowed_origins))
        .layer(RequestBodyLimitLayer::new(max_upload))
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed: &str) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.trim() == "*" {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}
