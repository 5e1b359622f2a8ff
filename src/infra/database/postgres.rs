//! PostgreSQL screening store implementation.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::domain::{
    AdverseMediaResult, AmlResult, AppError, DatabaseError, KycResult, KycStatus, PepResult,
    RiskLevel, SanctionsResult, ScreeningFilter, ScreeningPage, ScreeningRecord, ScreeningResult,
    ScreeningStatus, ScreeningStore, WalletIdentity,
};

const SCREENING_COLUMNS: &str = r#"
    id, screening_type, wallet_address, chain_id, screening_result,
    risk_level, risk_score, sanctions_match, sanctions_list,
    sanctions_confidence, aml_risk_score, aml_structuring_detected,
    aml_layering_detected, aml_high_risk_jurisdiction, kyc_status,
    kyc_verification_level, pep_match, pep_category, pep_relationship,
    pep_confidence, adverse_media_match, adverse_media_mention_type,
    adverse_media_severity, adverse_media_confidence, created_at
"#;

/// Shared WHERE clause; an unset filter binds NULL and imposes no constraint
const FILTER_CLAUSE: &str = r#"
    WHERE ($1::TEXT IS NULL OR wallet_address = $1)
      AND ($2::TEXT IS NULL OR chain_id = $2)
      AND ($3::TEXT IS NULL OR screening_result = $3)
      AND ($4::TEXT IS NULL OR risk_level = $4)
"#;

/// PostgreSQL connection pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(3),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// PostgreSQL screening store with connection pooling
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client with custom configuration
    pub async fn new(database_url: &SecretString, config: PostgresConfig) -> Result<Self, AppError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(database_url.expose_secret())
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Run database migrations using sqlx migrate
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Migration(e.to_string())))?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Parse a database row into a ScreeningRecord
    fn row_to_screening_record(row: &sqlx::postgres::PgRow) -> Result<ScreeningRecord, AppError> {
        let screening_result: String = row.get("screening_result");
        let risk_level: String = row.get("risk_level");
        let kyc_status: String = row.get("kyc_status");

        let corrupt = |message: String| AppError::Database(DatabaseError::Query(message));

        Ok(ScreeningRecord {
            id: row.get("id"),
            screening_type: row.get("screening_type"),
            wallet_address: row.get("wallet_address"),
            chain_id: row.get("chain_id"),
            result: ScreeningResult {
                screening_result: screening_result.parse::<ScreeningStatus>().map_err(corrupt)?,
                risk_level: risk_level.parse::<RiskLevel>().map_err(corrupt)?,
                risk_score: row.get("risk_score"),
                sanctions: SanctionsResult {
                    is_match: row.get("sanctions_match"),
                    list: row.get("sanctions_list"),
                    confidence: row.get("sanctions_confidence"),
                },
                aml: AmlResult {
                    risk_score: row.get("aml_risk_score"),
                    structuring_detected: row.get("aml_structuring_detected"),
                    layering_detected: row.get("aml_layering_detected"),
                    high_risk_jurisdiction: row.get("aml_high_risk_jurisdiction"),
                },
                kyc: KycResult {
                    status: kyc_status.parse::<KycStatus>().map_err(corrupt)?,
                    verification_level: row.get("kyc_verification_level"),
                },
                pep: PepResult {
                    is_match: row.get("pep_match"),
                    category: row.get("pep_category"),
                    relationship: row.get("pep_relationship"),
                    confidence: row.get("pep_confidence"),
                },
                adverse_media: AdverseMediaResult {
                    is_match: row.get("adverse_media_match"),
                    mention_type: row.get("adverse_media_mention_type"),
                    severity: row.get("adverse_media_severity"),
                    confidence: row.get("adverse_media_confidence"),
                },
            },
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl ScreeningStore for PostgresClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        Ok(())
    }

    #[instrument(skip(self, result), fields(wallet_address = %wallet.address, chain_id = %wallet.chain_id))]
    async fn insert_screening(
        &self,
        screening_type: &str,
        wallet: &WalletIdentity,
        result: &ScreeningResult,
    ) -> Result<ScreeningRecord, AppError> {
        let row = sqlx::query(
            r#"
            INSERT INTO compliance_screenings (
                screening_type, wallet_address, chain_id, screening_result,
                risk_level, risk_score, sanctions_match, sanctions_list,
                sanctions_confidence, aml_risk_score, aml_structuring_detected,
                aml_layering_detected, aml_high_risk_jurisdiction, kyc_status,
                kyc_verification_level, pep_match, pep_category, pep_relationship,
                pep_confidence, adverse_media_match, adverse_media_mention_type,
                adverse_media_severity, adverse_media_confidence, created_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21, $22, $23, NOW()
            )
            RETURNING id, created_at
            "#,
        )
        .bind(screening_type)
        .bind(&wallet.address)
        .bind(&wallet.chain_id)
        .bind(result.screening_result.as_str())
        .bind(result.risk_level.as_str())
        .bind(result.risk_score)
        .bind(result.sanctions.is_match)
        .bind(result.sanctions.list.as_deref())
        .bind(result.sanctions.confidence)
        .bind(result.aml.risk_score)
        .bind(result.aml.structuring_detected)
        .bind(result.aml.layering_detected)
        .bind(result.aml.high_risk_jurisdiction)
        .bind(result.kyc.status.as_str())
        .bind(&result.kyc.verification_level)
        .bind(result.pep.is_match)
        .bind(result.pep.category.as_deref())
        .bind(result.pep.relationship.as_deref())
        .bind(result.pep.confidence)
        .bind(result.adverse_media.is_match)
        .bind(result.adverse_media.mention_type.as_deref())
        .bind(result.adverse_media.severity.as_deref())
        .bind(result.adverse_media.confidence)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let id: i64 = row.get("id");
        debug!(id, "Screening row inserted");

        Ok(ScreeningRecord {
            id,
            screening_type: screening_type.to_string(),
            wallet_address: wallet.address.clone(),
            chain_id: wallet.chain_id.clone(),
            result: result.clone(),
            created_at: row.get("created_at"),
        })
    }

    #[instrument(skip(self))]
    async fn get_screening(&self, id: i64) -> Result<Option<ScreeningRecord>, AppError> {
        let query = format!(
            "SELECT {} FROM compliance_screenings WHERE id = $1",
            SCREENING_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(Some(Self::row_to_screening_record(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list_screenings(
        &self,
        filter: &ScreeningFilter,
        limit: i64,
        offset: i64,
    ) -> Result<ScreeningPage, AppError> {
        let wallet_address = filter.wallet_address.as_deref();
        let chain_id = filter.chain_id.as_deref();
        let screening_result = filter.screening_result.map(|s| s.as_str());
        let risk_level = filter.risk_level.map(|l| l.as_str());

        let page_query = format!(
            "SELECT {} FROM compliance_screenings {} ORDER BY created_at DESC, id DESC LIMIT $5 OFFSET $6",
            SCREENING_COLUMNS, FILTER_CLAUSE
        );
        let rows = sqlx::query(&page_query)
            .bind(wallet_address)
            .bind(chain_id)
            .bind(screening_result)
            .bind(risk_level)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let count_query = format!("SELECT COUNT(*) AS total FROM compliance_screenings {}", FILTER_CLAUSE);
        let total: i64 = sqlx::query(&count_query)
            .bind(wallet_address)
            .bind(chain_id)
            .bind(screening_result)
            .bind(risk_level)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .get("total");

        let records = rows
            .iter()
            .map(Self::row_to_screening_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ScreeningPage { records, total })
    }
}

/// Pool exhaustion and I/O failures mean the store is unreachable; everything else is a query failure
fn map_sqlx_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            AppError::Database(DatabaseError::Connection(e.to_string()))
        }
        other => AppError::Database(DatabaseError::Query(other.to_string())),
    }
}
