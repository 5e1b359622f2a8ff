//! Router construction and HTTP middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app::AppState;

use super::handlers::{
    ApiDoc, get_screening_handler, health_check_handler, list_screenings_handler,
    liveness_handler, readiness_handler, screen_batch_handler, screen_wallet_handler,
};

/// Default request timeout (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A full 100-address batch stays well under this
const MAX_BODY_BYTES: usize = 256 * 1024;

/// HTTP layer tuning
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

/// Create the router with default middleware settings
pub fn create_router(state: Arc<AppState>) -> Router {
    create_router_with_config(state, RouterConfig::default())
}

/// Create the router with custom middleware settings
pub fn create_router_with_config(state: Arc<AppState>, config: RouterConfig) -> Router {
    let api = Router::new()
        .route("/v1/risk/compliance/screen", post(screen_wallet_handler))
        .route(
            "/v1/risk/compliance/screen/batch",
            post(screen_batch_handler),
        )
        .route(
            "/v1/risk/compliance/screenings",
            get(list_screenings_handler),
        )
        .route(
            "/v1/risk/compliance/screenings/{id}",
            get(get_screening_handler),
        )
        .route("/health", get(health_check_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .with_state(state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
