//! Batch screening with per-item isolation.
//!
//! Every address becomes an independent task (classify then persist). A
//! failing item is captured in its own slot and never aborts its siblings.
//! Outcomes are joined back in input order. Tasks are detached once spawned,
//! so dropping the batch future stops scheduling new items while in-flight
//! items run to completion.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::domain::types::resolve_chain_id;
use crate::domain::{
    AppError, BatchItemFailure, BatchItemOutcome, MAX_BATCH_SIZE, ScreeningRecord,
    ScreeningStore, ValidationError, WalletIdentity,
};

use super::risk_engine::RiskEngine;
use super::service::{ServiceConfig, screen_and_persist};

/// Drives the risk engine and the store across a bounded list of addresses
pub struct BatchOrchestrator {
    store: Arc<dyn ScreeningStore>,
    engine: RiskEngine,
    config: ServiceConfig,
}

impl BatchOrchestrator {
    #[must_use]
    pub fn new(store: Arc<dyn ScreeningStore>, engine: RiskEngine, config: ServiceConfig) -> Self {
        Self {
            store,
            engine,
            config,
        }
    }

    /// Screen `addresses` on one chain. Rejects the whole batch before any work
    /// when it exceeds the configured maximum.
    #[instrument(skip(self, addresses), fields(count = addresses.len()))]
    pub async fn screen_batch(
        &self,
        addresses: &[String],
        chain_id: Option<&str>,
    ) -> Result<Vec<BatchItemOutcome>, AppError> {
        let max = self.config.max_batch_size.min(MAX_BATCH_SIZE);
        if addresses.len() > max {
            warn!(count = addresses.len(), max, "Batch rejected: too many addresses");
            return Err(AppError::Validation(ValidationError::BatchTooLarge {
                max,
                actual: addresses.len(),
            }));
        }

        let chain_id = resolve_chain_id(chain_id);
        info!(chain_id = %chain_id, "Batch screening started");

        let permits = Arc::new(Semaphore::new(
            self.config.max_concurrency.clamp(1, MAX_BATCH_SIZE),
        ));
        let mut pending: Vec<(WalletIdentity, JoinHandle<Result<ScreeningRecord, AppError>>)> =
            Vec::with_capacity(addresses.len());

        for address in addresses {
            let wallet = WalletIdentity {
                address: address.clone(),
                chain_id: chain_id.clone(),
            };
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|e| AppError::Internal(format!("Batch scheduler closed: {}", e)))?;

            let store = Arc::clone(&self.store);
            let engine = self.engine;
            let store_timeout = self.config.store_timeout;
            let task_wallet = wallet.clone();
            let handle = tokio::spawn(async move {
                let outcome =
                    screen_and_persist(store.as_ref(), &engine, store_timeout, &task_wallet).await;
                drop(permit);
                outcome
            });
            pending.push((wallet, handle));
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        for (index, (wallet, handle)) in pending.into_iter().enumerate() {
            let outcome = match handle.await {
                Ok(Ok(record)) => BatchItemOutcome::Screened(record),
                Ok(Err(e)) => {
                    warn!(
                        index,
                        wallet_address = %wallet.address,
                        error_type = e.kind(),
                        error = %e,
                        "Batch item failed"
                    );
                    failed(wallet, e.to_string())
                }
                Err(e) => {
                    error!(index, wallet_address = %wallet.address, error = %e, "Batch task aborted");
                    failed(wallet, "screening task failed".to_string())
                }
            };
            outcomes.push(outcome);
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        info!(
            total = outcomes.len(),
            succeeded,
            failed = outcomes.len() - succeeded,
            "Batch screening complete"
        );
        Ok(outcomes)
    }
}

fn failed(wallet: WalletIdentity, error: String) -> BatchItemOutcome {
    BatchItemOutcome::Failed(BatchItemFailure {
        wallet_address: wallet.address,
        chain_id: wallet.chain_id,
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::ScreeningStatus;
    use crate::test_utils::MockScreeningStore;

    fn orchestrator(store: Arc<MockScreeningStore>, config: ServiceConfig) -> BatchOrchestrator {
        BatchOrchestrator::new(store as Arc<dyn ScreeningStore>, RiskEngine::new(), config)
    }

    fn addresses(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("0x{:040x}", i + 1)).collect()
    }

    #[tokio::test]
    async fn test_empty_batch_yields_empty_result() {
        let store = Arc::new(MockScreeningStore::new());
        let outcomes = orchestrator(Arc::clone(&store), ServiceConfig::default())
            .screen_batch(&[], None)
            .await
            .unwrap();
        assert!(outcomes.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_oversized_batch_is_rejected_without_side_effects() {
        let store = Arc::new(MockScreeningStore::new());
        let err = orchestrator(Arc::clone(&store), ServiceConfig::default())
            .screen_batch(&addresses(101), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Validation(ValidationError::BatchTooLarge {
                max: 100,
                actual: 101
            })
        ));
        assert_eq!(store.len(), 0);
        assert_eq!(store.insert_attempts(), 0);
    }

    #[tokio::test]
    async fn test_full_batch_of_one_hundred_is_accepted() {
        let store = Arc::new(MockScreeningStore::new());
        let outcomes = orchestrator(Arc::clone(&store), ServiceConfig::default())
            .screen_batch(&addresses(100), None)
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 100);
        assert!(outcomes.iter().all(BatchItemOutcome::is_success));
        assert_eq!(store.len(), 100);
    }

    #[tokio::test]
    async fn test_failing_item_is_isolated_and_order_preserved() {
        let input: Vec<String> = vec![
            "0xaaa1".to_string(),
            "0x1234567890bb".to_string(),
            "0xbroken".to_string(),
            "0x5678901234dd".to_string(),
            "0xeee5".to_string(),
        ];
        let store = Arc::new(MockScreeningStore::new().failing_for("0xbroken"));
        let outcomes = orchestrator(Arc::clone(&store), ServiceConfig::default())
            .screen_batch(&input, Some("polygon"))
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 5);
        for (outcome, address) in outcomes.iter().zip(&input) {
            assert_eq!(outcome.wallet_address(), address);
        }

        match &outcomes[2] {
            BatchItemOutcome::Failed(failure) => {
                assert_eq!(failure.chain_id, "polygon");
                assert!(failure.error.contains("Database error"));
            }
            other => panic!("expected failure, got {:?}", other),
        }

        for index in [0, 1, 3, 4] {
            let record = outcomes[index].record().expect("expected success");
            assert_eq!(record.chain_id, "polygon");
            let stored = store.get(record.id).expect("record should be durable");
            assert_eq!(&stored, record);
        }
        assert_eq!(
            outcomes[1].record().unwrap().result.screening_result,
            ScreeningStatus::Flagged
        );
        assert_eq!(store.len(), 4);
    }

    #[tokio::test]
    async fn test_blank_entry_is_a_per_item_failure() {
        let store = Arc::new(MockScreeningStore::new());
        let input = vec!["0xabc".to_string(), "".to_string()];
        let outcomes = orchestrator(Arc::clone(&store), ServiceConfig::default())
            .screen_batch(&input, None)
            .await
            .unwrap();

        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_store_timeout_surfaces_per_item() {
        let store = Arc::new(MockScreeningStore::new().with_insert_delay(Duration::from_millis(200)));
        let config = ServiceConfig {
            store_timeout: Duration::from_millis(10),
            ..Default::default()
        };
        let outcomes = orchestrator(store, config)
            .screen_batch(&addresses(3), None)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        for outcome in outcomes {
            match outcome {
                BatchItemOutcome::Failed(failure) => assert!(failure.error.contains("timed out")),
                other => panic!("expected timeout failure, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_order_preserved_with_bounded_concurrency() {
        let store = Arc::new(MockScreeningStore::new().with_insert_delay(Duration::from_millis(5)));
        let config = ServiceConfig {
            max_concurrency: 3,
            ..Default::default()
        };
        let input = addresses(20);
        let outcomes = orchestrator(Arc::clone(&store), config)
            .screen_batch(&input, None)
            .await
            .unwrap();

        let got: Vec<&str> = outcomes.iter().map(BatchItemOutcome::wallet_address).collect();
        let expected: Vec<&str> = input.iter().map(String::as_str).collect();
        assert_eq!(got, expected);
        assert_eq!(store.len(), 20);
    }

    #[tokio::test]
    async fn test_dropped_batch_lets_in_flight_items_finish() {
        let store = Arc::new(MockScreeningStore::new().with_insert_delay(Duration::from_millis(50)));
        let config = ServiceConfig {
            max_concurrency: 2,
            ..Default::default()
        };
        let batch = orchestrator(Arc::clone(&store), config);
        let input = addresses(5);

        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), batch.screen_batch(&input, None)).await;
        assert!(cancelled.is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(store.len(), 2);
    }
}
