//! Rule-based wallet risk classification.
//!
//! The engine evaluates an ordered rule table against the lowercased wallet
//! address. The first rule whose trigger matches decides the outcome; when no
//! rule matches the baseline clear result is returned. Classification is pure
//! and total: it never fails and never touches shared state.
//!
//! The default table is a deterministic stand-in for sanctions, PEP and
//! adverse-media providers. Rule order is the precedence order.

use crate::domain::{
    AdverseMediaResult, PepResult, RiskLevel, SanctionsResult, ScreeningResult, ScreeningStatus,
    WalletIdentity,
};

/// One entry of the precedence-ordered rule table
#[derive(Debug, Clone, Copy)]
pub struct ScreeningRule {
    /// Name used in logs and tests
    pub name: &'static str,
    /// Lowercase substring that triggers this rule
    pub trigger: &'static str,
    /// Builds the full result produced when the rule fires
    pub outcome: fn() -> ScreeningResult,
}

impl ScreeningRule {
    /// `normalized_address` must already be lowercase.
    #[must_use]
    pub fn matches(&self, normalized_address: &str) -> bool {
        normalized_address.contains(self.trigger)
    }
}

/// Default rule table. Earlier entries take precedence.
pub const DEFAULT_RULES: &[ScreeningRule] = &[
    ScreeningRule {
        name: "sanctions",
        trigger: "1234567890",
        outcome: sanctions_match,
    },
    ScreeningRule {
        name: "pep",
        trigger: "5678901234",
        outcome: pep_match,
    },
    ScreeningRule {
        name: "adverse_media",
        trigger: "7890123456",
        outcome: adverse_media_match,
    },
];

fn sanctions_match() -> ScreeningResult {
    let mut result = ScreeningResult::baseline();
    result.screening_result = ScreeningStatus::Flagged;
    result.risk_level = RiskLevel::Critical;
    result.risk_score = 40.0;
    result.sanctions = SanctionsResult {
        is_match: true,
        list: Some("OFAC SDN".to_string()),
        confidence: 95,
    };
    result.aml.risk_score = 30;
    result
}

fn pep_match() -> ScreeningResult {
    let mut result = ScreeningResult::baseline();
    result.screening_result = ScreeningStatus::ReviewRequired;
    result.risk_level = RiskLevel::Medium;
    result.risk_score = 30.0;
    result.pep = PepResult {
        is_match: true,
        category: Some("government".to_string()),
        relationship: Some("direct".to_string()),
        confidence: 85,
    };
    result.aml.risk_score = 20;
    result
}

fn adverse_media_match() -> ScreeningResult {
    let mut result = ScreeningResult::baseline();
    result.screening_result = ScreeningStatus::ReviewRequired;
    result.risk_level = RiskLevel::Medium;
    result.risk_score = 25.0;
    result.adverse_media = AdverseMediaResult {
        is_match: true,
        mention_type: Some("fraud".to_string()),
        severity: Some("medium".to_string()),
        confidence: 75,
    };
    result.aml.risk_score = 15;
    result
}

/// Stateless first-match-wins classifier
#[derive(Debug, Clone, Copy)]
pub struct RiskEngine {
    rules: &'static [ScreeningRule],
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskEngine {
    /// Engine over [`DEFAULT_RULES`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_rules(DEFAULT_RULES)
    }

    /// Engine over a custom rule table, evaluated in slice order
    #[must_use]
    pub fn with_rules(rules: &'static [ScreeningRule]) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &'static [ScreeningRule] {
        self.rules
    }

    /// First rule matching the address, if any
    #[must_use]
    pub fn matching_rule(&self, address: &str) -> Option<&'static ScreeningRule> {
        let normalized = address.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&normalized))
    }

    /// Classify a wallet. `chain_id` is part of the contract but no current rule varies by chain.
    #[must_use]
    pub fn classify(&self, address: &str, chain_id: &str) -> ScreeningResult {
        match self.matching_rule(address) {
            Some(rule) => {
                tracing::debug!(rule = rule.name, chain_id, "Screening rule matched");
                (rule.outcome)()
            }
            None => ScreeningResult::baseline(),
        }
    }

    /// Convenience wrapper over [`RiskEngine::classify`]
    #[must_use]
    pub fn classify_wallet(&self, wallet: &WalletIdentity) -> ScreeningResult {
        self.classify(&wallet.address, &wallet.chain_id)
    }
}
