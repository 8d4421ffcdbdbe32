use std::any::Any;

use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::routes::{analyze, chat, fallback, health};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let api = Router::<AppState>::new()
        .nest("/analyze", analyze::router(state.config.max_upload_bytes))
        .nest("/chat", chat::router())
        .merge(health::router())
        .fallback(fallback::api_not_found);

    let router = Router::<AppState>::new().nest("/api", api);
    let router = with_client_bundle(router, &state.config);

    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origin))
        .with_state(state)
}

/// Serve the built client for every non-API path in production
fn with_client_bundle(router: Router<AppState>, config: &AppConfig) -> Router<AppState> {
    if config.is_production() {
        if config.static_dir.is_dir() {
            info!("Serving client bundle from {}", config.static_dir.display());
            let index = config.static_dir.join("index.html");
            return router.fallback_service(ServeDir::new(&config.static_dir).fallback(ServeFile::new(index)));
        }
        warn!(
            "Static directory {} not found, client bundle will not be served",
            config.static_dir.display()
        );
    }
    router.fallback(fallback::development_root)
}

fn cors_layer(cors_origin: &str) -> CorsLayer {
    if cors_origin.trim() == "*" {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = cors_origin
        .split(',')
        .filter_map(|origin| {
            HeaderValue::from_str(origin.trim())
                .map_err(|_| warn!("Ignoring invalid CORS origin: {}", origin))
                .ok()
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown error".to_string()
    };
    error!("Request handler panicked: {}", message);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Something went wrong!", "message": message })),
    )
        .into_response()
}
