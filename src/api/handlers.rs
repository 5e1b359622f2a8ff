//! HTTP request handlers with OpenAPI documentation.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use utoipa::OpenApi;

use crate::app::AppState;
use crate::domain::{
    AdverseMediaResult, AmlResult, ApiResponse, AppError, BatchItemFailure, BatchItemOutcome,
    BatchScreenRequest, DatabaseError, ErrorDetail, ErrorResponse, HealthResponse, HealthStatus,
    KycResult, KycStatus, ListScreeningsParams, PaginatedScreenings, PaginationMeta, PepResult,
    RiskLevel, SanctionsResult, ScreenWalletRequest, ScreeningRecord, ScreeningResult,
    ScreeningStatus, ValidationError,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wallet Screening API",
        version = "0.1.0",
        description = "API for screening wallet addresses for sanctions, PEP, adverse media and AML risk",
        license(
            name = "MIT"
        )
    ),
    paths(
        screen_wallet_handler,
        screen_batch_handler,
        get_screening_handler,
        list_screenings_handler,
        health_check_handler,
        liveness_handler,
        readiness_handler,
    ),
    components(
        schemas(
            ScreenWalletRequest,
            BatchScreenRequest,
            ScreeningRecord,
            ScreeningResult,
            ScreeningStatus,
            RiskLevel,
            SanctionsResult,
            AmlResult,
            KycResult,
            KycStatus,
            PepResult,
            AdverseMediaResult,
            BatchItemOutcome,
            BatchItemFailure,
            ApiResponse<ScreeningRecord>,
            ApiResponse<Vec<BatchItemOutcome>>,
            PaginatedScreenings,
            PaginationMeta,
            HealthResponse,
            HealthStatus,
            ErrorResponse,
            ErrorDetail,
        )
    ),
    tags(
        (name = "compliance", description = "Wallet screening endpoints"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Screen a single wallet
///
/// Classifies the wallet and persists the screening. The response echoes the
/// stored record including its assigned id.
#[utoipa::path(
    post,
    path = "/v1/risk/compliance/screen",
    tag = "compliance",
    request_body = ScreenWalletRequest,
    responses(
        (status = 200, description = "Screening completed and saved", body = ApiResponse<ScreeningRecord>),
        (status = 400, description = "wallet_address missing or body malformed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
        (status = 503, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn screen_wallet_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScreenWalletRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ScreeningRecord>>, AppError> {
    let Json(payload) = payload?;
    let record = state.service.screen_wallet(&payload).await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// Screen up to 100 wallets
///
/// Each address is screened and saved independently. A failing address yields
/// an `{walletAddress, chainId, error}` entry at its position; the others are
/// unaffected. Batches over 100 addresses are rejected without screening any.
#[utoipa::path(
    post,
    path = "/v1/risk/compliance/screen/batch",
    tag = "compliance",
    request_body = BatchScreenRequest,
    responses(
        (status = 200, description = "Per-address outcomes in input order", body = ApiResponse<Vec<BatchItemOutcome>>),
        (status = 400, description = "More than 100 addresses or body malformed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn screen_batch_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BatchScreenRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Vec<BatchItemOutcome>>>, AppError> {
    let Json(payload) = payload?;
    let outcomes = state.service.screen_batch(&payload).await?;
    Ok(Json(ApiResponse::ok(outcomes)))
}

/// Get a screening by id
#[utoipa::path(
    get,
    path = "/v1/risk/compliance/screenings/{id}",
    tag = "compliance",
    params(
        ("id" = i64, Path, description = "Screening id")
    ),
    responses(
        (status = 200, description = "Screening found", body = ApiResponse<ScreeningRecord>),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Screening not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_screening_handler(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<ScreeningRecord>>, AppError> {
    let Path(id) = id?;
    let record = state.service.get_screening(id).await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// List screenings, most recent first
#[utoipa::path(
    get,
    path = "/v1/risk/compliance/screenings",
    tag = "compliance",
    params(ListScreeningsParams),
    responses(
        (status = 200, description = "Page of screenings", body = PaginatedScreenings),
        (status = 400, description = "Invalid filter or pagination parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_screenings_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListScreeningsParams>, QueryRejection>,
) -> Result<Json<PaginatedScreenings>, AppError> {
    let Query(params) = params?;
    let page = state.service.list_screenings(&params).await?;
    Ok(Json(PaginatedScreenings::new(
        page,
        params.limit,
        params.offset,
    )))
}

/// Detailed health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.service.health_check().await;
    Json(health)
}

/// Kubernetes liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Application is alive")
    )
)]
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Application is ready to serve traffic"),
        (status = 503, description = "Application is not ready")
    )
)]
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    let health = state.service.health_check().await;
    match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

// Extractor rejections carry axum's plain-text bodies; route them through the
// error envelope instead.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(ValidationError::Malformed(rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(ValidationError::Malformed(rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(ValidationError::Malformed(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(db_err) => match db_err {
                DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
                DatabaseError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
                DatabaseError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let error_type = self.kind();
        let message = match &self {
            AppError::Validation(e) => e.to_string(),
            AppError::Database(DatabaseError::NotFound(_)) => "Screening not found".to_string(),
            _ => self.to_string(),
        };

        if status.is_server_error() {
            error!(error_type = %error_type, message = %message, "Server error");
        }

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                r#type: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}
