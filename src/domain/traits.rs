//! Domain traits defining contracts for external systems.

use async_trait::async_trait;

use super::error::AppError;
use super::types::{ScreeningFilter, ScreeningPage, ScreeningRecord, ScreeningResult, WalletIdentity};

/// Append-only persistence for screening records.
///
/// Implementations must make each insert atomic: a record is either fully
/// visible to readers with its identity assigned, or not visible at all.
#[async_trait]
pub trait ScreeningStore: Send + Sync {
    /// Check store connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// Persist a screening, returning the record with its assigned identity and timestamp.
    /// Identities are strictly increasing and never reused.
    async fn insert_screening(
        &self,
        screening_type: &str,
        wallet: &WalletIdentity,
        result: &ScreeningResult,
    ) -> Result<ScreeningRecord, AppError>;

    /// Exact lookup by identity
    async fn get_screening(&self, id: i64) -> Result<Option<ScreeningRecord>, AppError>;

    /// Filtered page ordered most recent first, with the total count of matching rows
    async fn list_screenings(
        &self,
        filter: &ScreeningFilter,
        limit: i64,
        offset: i64,
    ) -> Result<ScreeningPage, AppError>;
}
