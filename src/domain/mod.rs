//! Domain layer containing core business types, traits, and error definitions.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{AppError, ConfigError, DatabaseError, ValidationError};
pub use traits::ScreeningStore;
pub use types::{
    AdverseMediaResult, AmlResult, ApiResponse, BatchItemFailure, BatchItemOutcome,
    BatchScreenRequest, DEFAULT_CHAIN_ID, DEFAULT_PAGE_LIMIT, DEFAULT_SCREENING_TYPE, ErrorDetail,
    ErrorResponse, HealthResponse, HealthStatus, KycResult, KycStatus, ListScreeningsParams,
    MAX_BATCH_SIZE, PaginatedScreenings, PaginationMeta, PepResult, RiskLevel, SanctionsResult,
    ScreenWalletRequest, ScreeningFilter, ScreeningPage, ScreeningRecord, ScreeningResult,
    ScreeningStatus, WalletIdentity,
};
