//! # him-api
//!
//! REST API layer for Project HIM. Every handler does its reads and writes
//! inside one database unit of work.

pub mod auth;
pub mod extract;
pub mod middleware;
pub mod routes;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    Router,
};
use him_common::config::Settings;
use him_db::{storage::LocalStorage, Database};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Arc<Settings>,
    /// Disk storage for member photos under `UPLOAD_DIR`.
    pub storage: LocalStorage,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let storage = LocalStorage::new(&settings.upload_dir);
        Self {
            db,
            settings: Arc::new(settings),
            storage,
        }
    }
}

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);

    let api_routes = Router::new()
        .merge(routes::users::router())
        .merge(routes::members::router())
        .merge(routes::departments::router())
        .merge(routes::classes::router())
        .merge(routes::rooms::router())
        .merge(routes::auth::router(state.clone()));

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", api_routes)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(cors_layer(&state.settings.allowed_origins))
        .layer(DefaultBodyLimit::max(state.settings.max_upload_size))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state)
}

/// CORS for the configured origins only. Credentials are allowed, so methods
/// and headers must be listed explicitly.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}
