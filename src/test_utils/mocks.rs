//! Mock implementations for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::{
    AppError, DatabaseError, ScreeningFilter, ScreeningPage, ScreeningRecord, ScreeningResult,
    ScreeningStore, WalletIdentity,
};

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }
}

#[derive(Default)]
struct Storage {
    records: BTreeMap<i64, ScreeningRecord>,
    next_id: i64,
}

/// In-memory screening store for testing
pub struct MockScreeningStore {
    storage: Arc<Mutex<Storage>>,
    config: MockConfig,
    /// Addresses whose inserts fail, simulating a per-item outage
    failing_addresses: HashSet<String>,
    insert_delay: Option<Duration>,
    read_delay: Option<Duration>,
    insert_attempts: AtomicUsize,
    is_healthy: AtomicBool,
}

impl MockScreeningStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            storage: Arc::new(Mutex::new(Storage::default())),
            config,
            failing_addresses: HashSet::new(),
            insert_delay: None,
            read_delay: None,
            insert_attempts: AtomicUsize::new(0),
            is_healthy: AtomicBool::new(true),
        }
    }

    /// Every operation fails with a connection error
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Inserts for `address` fail; everything else succeeds
    #[must_use]
    pub fn failing_for(mut self, address: impl Into<String>) -> Self {
        self.failing_addresses.insert(address.into());
        self
    }

    /// Delay every insert, for timeout and scheduling tests
    #[must_use]
    pub fn with_insert_delay(mut self, delay: Duration) -> Self {
        self.insert_delay = Some(delay);
        self
    }

    /// Delay every get and list, for read timeout tests
    #[must_use]
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Number of persisted records
    pub fn len(&self) -> usize {
        self.storage.lock().unwrap().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of insert calls received, successful or not
    pub fn insert_attempts(&self) -> usize {
        self.insert_attempts.load(Ordering::SeqCst)
    }

    /// Direct lookup bypassing failure injection
    pub fn get(&self, id: i64) -> Option<ScreeningRecord> {
        self.storage.lock().unwrap().records.get(&id).cloned()
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock error".to_string());
            return Err(AppError::Database(DatabaseError::Connection(msg)));
        }
        Ok(())
    }
}

impl Default for MockScreeningStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScreeningStore for MockScreeningStore {
    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Database(DatabaseError::Connection(
                "Unhealthy".to_string(),
            )));
        }
        self.check_should_fail()
    }

    async fn insert_screening(
        &self,
        screening_type: &str,
        wallet: &WalletIdentity,
        result: &ScreeningResult,
    ) -> Result<ScreeningRecord, AppError> {
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }
        self.check_should_fail()?;
        if self.failing_addresses.contains(&wallet.address) {
            return Err(AppError::Database(DatabaseError::Query(format!(
                "Simulated outage for {}",
                wallet.address
            ))));
        }

        let mut storage = self.storage.lock().unwrap();
        storage.next_id += 1;
        let id = storage.next_id;
        // keep timestamps non-decreasing in id order
        let now = Utc::now();
        let created_at = storage
            .records
            .values()
            .next_back()
            .map(|last| last.created_at.max(now))
            .unwrap_or(now);
        let record = ScreeningRecord {
            id,
            screening_type: screening_type.to_string(),
            wallet_address: wallet.address.clone(),
            chain_id: wallet.chain_id.clone(),
            result: result.clone(),
            created_at,
        };
        storage.records.insert(id, record.clone());
        Ok(record)
    }

    async fn get_screening(&self, id: i64) -> Result<Option<ScreeningRecord>, AppError> {
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        self.check_should_fail()?;
        Ok(self.get(id))
    }

    async fn list_screenings(
        &self,
        filter: &ScreeningFilter,
        limit: i64,
        offset: i64,
    ) -> Result<ScreeningPage, AppError> {
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        self.check_should_fail()?;
        let storage = self.storage.lock().unwrap();
        let mut items: Vec<ScreeningRecord> = storage
            .records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = items.len() as i64;
        let records = items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok(ScreeningPage { records, total })
    }
}
