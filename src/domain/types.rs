//! Domain types with validation support.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::error::ValidationError;

/// Chain assumed when a caller omits `chain_id`
pub const DEFAULT_CHAIN_ID: &str = "ethereum";

/// Screening type recorded for every screening produced by the rule engine
pub const DEFAULT_SCREENING_TYPE: &str = "comprehensive";

/// Maximum number of addresses accepted in one batch request
pub const MAX_BATCH_SIZE: usize = 100;

/// Default page size for screening history queries
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Overall outcome of a screening
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningStatus {
    /// No rule matched
    #[default]
    Clear,
    /// A rule matched that needs analyst review
    ReviewRequired,
    /// A blocking match (e.g. sanctions)
    Flagged,
}

impl ScreeningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::ReviewRequired => "review_required",
            Self::Flagged => "flagged",
        }
    }
}

impl std::str::FromStr for ScreeningStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clear" => Ok(Self::Clear),
            "review_required" => Ok(Self::ReviewRequired),
            "flagged" => Ok(Self::Flagged),
            _ => Err(format!("Invalid screening result: {}", s)),
        }
    }
}

impl std::fmt::Display for ScreeningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Risk classification attached to a screening
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::Critical => "critical",
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Invalid risk level: {}", s)),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// KYC verification state of the wallet owner
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    #[default]
    Verified,
    Unverified,
    Pending,
}

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Unverified => "unverified",
            Self::Pending => "pending",
        }
    }
}

impl std::str::FromStr for KycStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verified" => Ok(Self::Verified),
            "unverified" => Ok(Self::Unverified),
            "pending" => Ok(Self::Pending),
            _ => Err(format!("Invalid KYC status: {}", s)),
        }
    }
}

impl std::fmt::Display for KycStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sanctions list screening sub-result
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SanctionsResult {
    #[serde(rename = "match")]
    pub is_match: bool,
    /// Name of the matched watchlist
    #[schema(example = "OFAC SDN")]
    pub list: Option<String>,
    /// Match confidence, 0-100
    pub confidence: i32,
}

/// Anti-money-laundering sub-assessment
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AmlResult {
    pub risk_score: i32,
    pub structuring_detected: bool,
    pub layering_detected: bool,
    pub high_risk_jurisdiction: bool,
}

/// KYC sub-result
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KycResult {
    pub status: KycStatus,
    #[schema(example = "basic")]
    pub verification_level: String,
}

/// Politically-exposed-person sub-result
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PepResult {
    #[serde(rename = "match")]
    pub is_match: bool,
    #[schema(example = "government")]
    pub category: Option<String>,
    #[schema(example = "direct")]
    pub relationship: Option<String>,
    pub confidence: i32,
}

/// Adverse media sub-result
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdverseMediaResult {
    #[serde(rename = "match")]
    pub is_match: bool,
    #[schema(example = "fraud")]
    pub mention_type: Option<String>,
    #[schema(example = "medium")]
    pub severity: Option<String>,
    pub confidence: i32,
}

/// Structured output of the risk engine for one wallet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningResult {
    pub screening_result: ScreeningStatus,
    pub risk_level: RiskLevel,
    #[schema(example = 10.0)]
    pub risk_score: f64,
    pub sanctions: SanctionsResult,
    pub aml: AmlResult,
    pub kyc: KycResult,
    pub pep: PepResult,
    pub adverse_media: AdverseMediaResult,
}

impl ScreeningResult {
    /// Result returned when no rule matches
    #[must_use]
    pub fn baseline() -> Self {
        Self {
            screening_result: ScreeningStatus::Clear,
            risk_level: RiskLevel::Low,
            risk_score: 10.0,
            sanctions: SanctionsResult::default(),
            aml: AmlResult {
                risk_score: 10,
                ..Default::default()
            },
            kyc: KycResult {
                status: KycStatus::Verified,
                verification_level: "basic".to_string(),
            },
            pep: PepResult::default(),
            adverse_media: AdverseMediaResult::default(),
        }
    }

    /// Whether any list (sanctions, PEP, adverse media) matched
    #[must_use]
    pub fn has_match(&self) -> bool {
        self.sanctions.is_match || self.pep.is_match || self.adverse_media.is_match
    }
}

impl Default for ScreeningResult {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Wallet address plus the chain it lives on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletIdentity {
    /// Address in the casing supplied by the caller
    pub address: String,
    pub chain_id: String,
}

impl WalletIdentity {
    /// Build an identity, falling back to [`DEFAULT_CHAIN_ID`] when the chain is omitted or blank
    #[must_use]
    pub fn new(address: impl Into<String>, chain_id: Option<&str>) -> Self {
        Self {
            address: address.into(),
            chain_id: resolve_chain_id(chain_id),
        }
    }

    /// Lowercased address used for pattern matching only
    #[must_use]
    pub fn normalized_address(&self) -> String {
        self.address.to_lowercase()
    }
}

pub(crate) fn resolve_chain_id(chain_id: Option<&str>) -> String {
    chain_id
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CHAIN_ID)
        .to_string()
}

/// Persisted screening entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningRecord {
    /// Server-assigned, strictly increasing identity
    #[schema(example = 42)]
    pub id: i64,
    #[schema(example = "comprehensive")]
    pub screening_type: String,
    #[schema(example = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e")]
    pub wallet_address: String,
    #[schema(example = "ethereum")]
    pub chain_id: String,
    #[serde(flatten)]
    pub result: ScreeningResult,
    pub created_at: DateTime<Utc>,
}

/// Per-item failure inside a batch response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemFailure {
    pub wallet_address: String,
    pub chain_id: String,
    #[schema(example = "Database error: Connection failed: connection refused")]
    pub error: String,
}

/// Outcome of one address in a batch, in input order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(untagged)]
pub enum BatchItemOutcome {
    Screened(ScreeningRecord),
    Failed(BatchItemFailure),
}

impl BatchItemOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Screened(_))
    }

    #[must_use]
    pub fn wallet_address(&self) -> &str {
        match self {
            Self::Screened(record) => &record.wallet_address,
            Self::Failed(failure) => &failure.wallet_address,
        }
    }

    #[must_use]
    pub fn record(&self) -> Option<&ScreeningRecord> {
        match self {
            Self::Screened(record) => Some(record),
            Self::Failed(_) => None,
        }
    }
}

/// Request to screen a single wallet
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ScreenWalletRequest {
    /// Wallet address to screen
    #[validate(custom(function = "validate_not_blank", message = "wallet_address is required"))]
    #[serde(default, deserialize_with = "null_as_blank")]
    #[schema(example = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e")]
    pub wallet_address: String,
    /// Chain identifier (default: ethereum)
    #[schema(example = "ethereum")]
    pub chain_id: Option<String>,
}

impl ScreenWalletRequest {
    #[must_use]
    pub fn new(wallet_address: impl Into<String>, chain_id: Option<String>) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            chain_id,
        }
    }

    /// Identity to screen, with the default chain applied
    #[must_use]
    pub fn identity(&self) -> WalletIdentity {
        WalletIdentity::new(self.wallet_address.clone(), self.chain_id.as_deref())
    }
}

/// Request to screen many wallets on one chain.
/// The size limit is enforced by the batch orchestrator before any work starts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchScreenRequest {
    /// Addresses to screen, at most 100
    #[serde(default)]
    pub wallet_addresses: Vec<String>,
    /// Chain identifier shared by every address (default: ethereum)
    #[schema(example = "ethereum")]
    pub chain_id: Option<String>,
}

impl BatchScreenRequest {
    #[must_use]
    pub fn new(wallet_addresses: Vec<String>, chain_id: Option<String>) -> Self {
        Self {
            wallet_addresses,
            chain_id,
        }
    }
}

/// An explicit `null` reads the same as an omitted field
fn null_as_blank<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn validate_not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

/// Optional AND-combined filters over screening history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreeningFilter {
    pub wallet_address: Option<String>,
    pub chain_id: Option<String>,
    pub screening_result: Option<ScreeningStatus>,
    pub risk_level: Option<RiskLevel>,
}

impl ScreeningFilter {
    #[must_use]
    pub fn matches(&self, record: &ScreeningRecord) -> bool {
        self.wallet_address
            .as_ref()
            .is_none_or(|a| *a == record.wallet_address)
            && self.chain_id.as_ref().is_none_or(|c| *c == record.chain_id)
            && self
                .screening_result
                .is_none_or(|s| s == record.result.screening_result)
            && self.risk_level.is_none_or(|l| l == record.result.risk_level)
    }
}

/// Query parameters for listing screenings
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListScreeningsParams {
    /// Exact wallet address match
    pub wallet_address: Option<String>,
    /// Exact chain match
    pub chain_id: Option<String>,
    /// clear | review_required | flagged
    pub screening_result: Option<String>,
    /// low | medium | critical
    pub risk_level: Option<String>,
    /// Page size (1-100, default: 10)
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Matching rows to skip (default: 0)
    #[validate(range(min = 0, message = "Offset must not be negative"))]
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

impl Default for ListScreeningsParams {
    fn default() -> Self {
        Self {
            wallet_address: None,
            chain_id: None,
            screening_result: None,
            risk_level: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl ListScreeningsParams {
    /// Parse the raw string filters. Blank values impose no constraint.
    pub fn filter(&self) -> Result<ScreeningFilter, ValidationError> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }

        let screening_result = present(&self.screening_result)
            .map(|v| {
                v.parse::<ScreeningStatus>()
                    .map_err(|message| ValidationError::InvalidField {
                        field: "screening_result".to_string(),
                        message,
                    })
            })
            .transpose()?;
        let risk_level = present(&self.risk_level)
            .map(|v| {
                v.parse::<RiskLevel>()
                    .map_err(|message| ValidationError::InvalidField {
                        field: "risk_level".to_string(),
                        message,
                    })
            })
            .transpose()?;

        Ok(ScreeningFilter {
            wallet_address: present(&self.wallet_address).map(str::to_string),
            chain_id: present(&self.chain_id).map(str::to_string),
            screening_result,
            risk_level,
        })
    }
}

/// One page of screening history plus the size of the filtered set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreeningPage {
    pub records: Vec<ScreeningRecord>,
    /// Count of all matching rows, independent of limit/offset
    pub total: i64,
}

/// Success envelope
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T: ToSchema> {
    pub success: bool,
    pub data: T,
}

impl<T: ToSchema> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Pagination metadata echoed with list responses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PaginationMeta {
    /// Total matching rows
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Paginated list envelope
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedScreenings {
    pub success: bool,
    pub data: Vec<ScreeningRecord>,
    pub pagination: PaginationMeta,
}

impl PaginatedScreenings {
    #[must_use]
    pub fn new(page: ScreeningPage, limit: i64, offset: i64) -> Self {
        Self {
            success: true,
            data: page.records,
            pagination: PaginationMeta {
                total: page.total,
                limit,
                offset,
            },
        }
    }
}

/// Health status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall system status
    pub status: HealthStatus,
    /// Database health status
    pub database: HealthStatus,
    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
    /// Application version
    #[schema(example = "0.1.0")]
    pub version: String,
}

impl HealthResponse {
    #[must_use]
    pub fn new(database: HealthStatus) -> Self {
        Self {
            status: database,
            database,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Error type identifier
    #[schema(example = "validation_error")]
    pub r#type: String,
    /// Human-readable error message
    #[schema(example = "wallet_address is required")]
    pub message: String,
}
