//! Application service: single-wallet screening, batch delegation and history queries.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};
use validator::Validate;

use crate::domain::{
    AppError, BatchItemOutcome, BatchScreenRequest, DEFAULT_SCREENING_TYPE, DatabaseError,
    HealthResponse, HealthStatus, ListScreeningsParams, MAX_BATCH_SIZE, ScreenWalletRequest,
    ScreeningPage, ScreeningRecord, ScreeningStore, ValidationError, WalletIdentity,
};

use super::batch::BatchOrchestrator;
use super::risk_engine::RiskEngine;

/// Default per-call persistence timeout (5 seconds)
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of batch items screened concurrently
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Tuning for the screening service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Upper bound on a single store call; elapsed calls surface as `DatabaseError::Timeout`
    pub store_timeout: Duration,
    /// Largest batch accepted
    pub max_batch_size: usize,
    /// In-flight per-item tasks within one batch
    pub max_concurrency: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
            max_batch_size: MAX_BATCH_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// Application service containing the screening use cases
pub struct ScreeningService {
    store: Arc<dyn ScreeningStore>,
    engine: RiskEngine,
    batch: BatchOrchestrator,
    config: ServiceConfig,
}

impl ScreeningService {
    #[must_use]
    pub fn new(store: Arc<dyn ScreeningStore>) -> Self {
        Self::with_config(store, RiskEngine::new(), ServiceConfig::default())
    }

    #[must_use]
    pub fn with_config(
        store: Arc<dyn ScreeningStore>,
        engine: RiskEngine,
        config: ServiceConfig,
    ) -> Self {
        let batch = BatchOrchestrator::new(Arc::clone(&store), engine, config.clone());
        Self {
            store,
            engine,
            batch,
            config,
        }
    }

    /// Screen one wallet and persist the result.
    /// Storage failures propagate to the caller.
    #[instrument(skip(self, request), fields(wallet_address = %request.wallet_address))]
    pub async fn screen_wallet(
        &self,
        request: &ScreenWalletRequest,
    ) -> Result<ScreeningRecord, AppError> {
        request.validate().map_err(|e| {
            warn!(error = %e, "Validation failed");
            AppError::Validation(ValidationError::MissingField("wallet_address".to_string()))
        })?;

        let wallet = request.identity();
        let record = screen_and_persist(
            self.store.as_ref(),
            &self.engine,
            self.config.store_timeout,
            &wallet,
        )
        .await?;

        info!(
            id = record.id,
            chain_id = %record.chain_id,
            result = %record.result.screening_result,
            "Screening saved"
        );
        Ok(record)
    }

    /// Screen a list of wallets with per-item isolation
    #[instrument(skip(self, request), fields(count = request.wallet_addresses.len()))]
    pub async fn screen_batch(
        &self,
        request: &BatchScreenRequest,
    ) -> Result<Vec<BatchItemOutcome>, AppError> {
        self.batch
            .screen_batch(&request.wallet_addresses, request.chain_id.as_deref())
            .await
    }

    /// Get a screening by identity
    #[instrument(skip(self))]
    pub async fn get_screening(&self, id: i64) -> Result<ScreeningRecord, AppError> {
        if id <= 0 {
            return Err(AppError::Validation(ValidationError::InvalidField {
                field: "id".to_string(),
                message: "Screening id must be a positive integer".to_string(),
            }));
        }

        with_store_timeout(self.config.store_timeout, self.store.get_screening(id))
            .await?
            .ok_or_else(|| AppError::Database(DatabaseError::NotFound(id.to_string())))
    }

    /// Filtered, paginated screening history, most recent first
    #[instrument(skip(self))]
    pub async fn list_screenings(
        &self,
        params: &ListScreeningsParams,
    ) -> Result<ScreeningPage, AppError> {
        params.validate().map_err(|e| {
            warn!(error = %e, "Invalid list parameters");
            AppError::Validation(ValidationError::Multiple(e.to_string()))
        })?;
        let filter = params.filter()?;

        with_store_timeout(
            self.config.store_timeout,
            self.store.list_screenings(&filter, params.limit, params.offset),
        )
        .await
    }

    /// Perform health check on the store
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> HealthResponse {
        let health = with_store_timeout(self.config.store_timeout, self.store.health_check()).await;
        let database = match health {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = %e, "Store health check failed");
                HealthStatus::Unhealthy
            }
        };
        HealthResponse::new(database)
    }
}

/// Classify a wallet and persist the result under the store timeout.
/// Shared by the single and batch paths so both enforce the same rules.
pub(crate) async fn screen_and_persist(
    store: &dyn ScreeningStore,
    engine: &RiskEngine,
    store_timeout: Duration,
    wallet: &WalletIdentity,
) -> Result<ScreeningRecord, AppError> {
    if wallet.address.trim().is_empty() {
        return Err(AppError::Validation(ValidationError::MissingField(
            "wallet_address".to_string(),
        )));
    }

    let result = engine.classify_wallet(wallet);

    with_store_timeout(
        store_timeout,
        store.insert_screening(DEFAULT_SCREENING_TYPE, wallet, &result),
    )
    .await
}

/// Bound a store call; an elapsed call surfaces as `DatabaseError::Timeout`
async fn with_store_timeout<T>(
    store_timeout: Duration,
    call: impl Future<Output = Result<T, AppError>>,
) -> Result<T, AppError> {
    tokio::time::timeout(store_timeout, call)
        .await
        .map_err(|_| AppError::Database(DatabaseError::Timeout(store_timeout.as_millis() as u64)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RiskLevel, ScreeningStatus};
    use crate::test_utils::MockScreeningStore;

    fn service_with(store: Arc<MockScreeningStore>) -> ScreeningService {
        ScreeningService::new(store as Arc<dyn ScreeningStore>)
    }

    #[tokio::test]
    async fn test_screen_wallet_persists_record() {
        let store = Arc::new(MockScreeningStore::new());
        let service = service_with(Arc::clone(&store));

        let record = service
            .screen_wallet(&ScreenWalletRequest::new("0xAbC1234567890", None))
            .await
            .unwrap();

        assert_eq!(record.wallet_address, "0xAbC1234567890");
        assert_eq!(record.chain_id, "ethereum");
        assert_eq!(record.screening_type, "comprehensive");
        assert_eq!(record.result.screening_result, ScreeningStatus::Flagged);

        let fetched = service.get_screening(record.id).await.unwrap();
        assert_eq!(fetched, record);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_screen_wallet_rejects_missing_address() {
        let store = Arc::new(MockScreeningStore::new());
        let service = service_with(Arc::clone(&store));

        let err = service
            .screen_wallet(&ScreenWalletRequest::new("  ", None))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Validation(ValidationError::MissingField(_))
        ));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_screen_wallet_propagates_storage_error() {
        let store = Arc::new(MockScreeningStore::failing("connection refused"));
        let service = service_with(store);

        let err = service
            .screen_wallet(&ScreenWalletRequest::new("0xabc", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(DatabaseError::Connection(_))));
    }

    #[tokio::test]
    async fn test_screen_wallet_times_out() {
        let store = Arc::new(MockScreeningStore::new().with_insert_delay(Duration::from_millis(200)));
        let config = ServiceConfig {
            store_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let service = ScreeningService::with_config(
            Arc::clone(&store) as Arc<dyn ScreeningStore>,
            RiskEngine::new(),
            config,
        );

        let err = service
            .screen_wallet(&ScreenWalletRequest::new("0xabc", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(DatabaseError::Timeout(20))));
    }

    #[tokio::test]
    async fn test_reads_are_bounded_by_store_timeout() {
        let store = Arc::new(MockScreeningStore::new().with_read_delay(Duration::from_millis(200)));
        let config = ServiceConfig {
            store_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let service = ScreeningService::with_config(
            Arc::clone(&store) as Arc<dyn ScreeningStore>,
            RiskEngine::new(),
            config,
        );

        let record = service
            .screen_wallet(&ScreenWalletRequest::new("0xabc", None))
            .await
            .unwrap();

        let err = service.get_screening(record.id).await.unwrap_err();
        assert!(matches!(err, AppError::Database(DatabaseError::Timeout(20))));
        assert_eq!(err.kind(), "timeout");

        let err = service
            .list_screenings(&ListScreeningsParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(DatabaseError::Timeout(20))));
    }

    #[tokio::test]
    async fn test_same_address_twice_creates_two_records() {
        let store = Arc::new(MockScreeningStore::new());
        let service = service_with(Arc::clone(&store));
        let request = ScreenWalletRequest::new("0xabc", Some("polygon".to_string()));

        let first = service.screen_wallet(&request).await.unwrap();
        let second = service.screen_wallet(&request).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(second.id > first.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_get_screening_not_found() {
        let service = service_with(Arc::new(MockScreeningStore::new()));

        let err = service.get_screening(99).await.unwrap_err();
        assert!(err.is_not_found());

        let err = service.get_screening(0).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_pagination_over_fifteen_records() {
        let service = service_with(Arc::new(MockScreeningStore::new()));
        let mut ids = Vec::new();
        for i in 0..15 {
            let record = service
                .screen_wallet(&ScreenWalletRequest::new(format!("0xwallet{i}"), None))
                .await
                .unwrap();
            ids.push(record.id);
        }
        ids.reverse();

        let page = service
            .list_screenings(&ListScreeningsParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 15);
        let got: Vec<i64> = page.records.iter().map(|r| r.id).collect();
        assert_eq!(got, ids[..10]);

        let params = ListScreeningsParams {
            offset: 10,
            ..Default::default()
        };
        let page = service.list_screenings(&params).await.unwrap();
        assert_eq!(page.total, 15);
        let got: Vec<i64> = page.records.iter().map(|r| r.id).collect();
        assert_eq!(got, ids[10..]);
    }

    #[tokio::test]
    async fn test_list_filters_by_risk_level() {
        let service = service_with(Arc::new(MockScreeningStore::new()));
        for address in [
            "0xclean1",
            "0x1234567890aa",
            "0x5678901234bb",
            "0x1234567890cc",
            "0x7890123456dd",
            "0x1234567890ee",
        ] {
            service
                .screen_wallet(&ScreenWalletRequest::new(address, None))
                .await
                .unwrap();
        }

        let params = ListScreeningsParams {
            risk_level: Some("critical".to_string()),
            limit: 2,
            ..Default::default()
        };
        let page = service.list_screenings(&params).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.records.len(), 2);
        assert!(page.records.iter().all(|r| {
            r.result.risk_level == RiskLevel::Critical
                && r.result.screening_result == ScreeningStatus::Flagged
        }));
    }

    #[tokio::test]
    async fn test_list_filters_combine_with_and() {
        let service = service_with(Arc::new(MockScreeningStore::new()));
        for (address, chain) in [
            ("0x5678901234", "ethereum"),
            ("0x5678901234", "polygon"),
            ("0x7890123456", "polygon"),
        ] {
            service
                .screen_wallet(&ScreenWalletRequest::new(address, Some(chain.to_string())))
                .await
                .unwrap();
        }

        let params = ListScreeningsParams {
            chain_id: Some("polygon".to_string()),
            screening_result: Some("review_required".to_string()),
            wallet_address: Some("0x5678901234".to_string()),
            ..Default::default()
        };
        let page = service.list_screenings(&params).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.records[0].chain_id, "polygon");
    }

    #[tokio::test]
    async fn test_list_rejects_invalid_params() {
        let service = service_with(Arc::new(MockScreeningStore::new()));

        let params = ListScreeningsParams {
            limit: 500,
            ..Default::default()
        };
        assert!(matches!(
            service.list_screenings(&params).await,
            Err(AppError::Validation(_))
        ));

        let params = ListScreeningsParams {
            screening_result: Some("maybe".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.list_screenings(&params).await,
            Err(AppError::Validation(ValidationError::InvalidField { .. }))
        ));
    }

    #[tokio::test]
    async fn test_health_check_reflects_store() {
        let store = Arc::new(MockScreeningStore::new());
        let service = service_with(Arc::clone(&store));

        assert_eq!(service.health_check().await.status, HealthStatus::Healthy);

        store.set_healthy(false);
        let health = service.health_check().await;
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(health.database, HealthStatus::Unhealthy);
    }
}
