//! Compliance checks over the combined crew output
//!
//! Rules-based verification before final output.
//! Failures annotate the result; they never abort the request.

use crate::models::{ComplianceCheck, RiskLevel, VerificationResult};
use chrono::Utc;
use tracing::{info, warn};

pub const DISCLAIMER_RULE: &str = "disclaimer_present";

pub const STANDARD_DISCLAIMER: &str = "Disclaimer: This analysis is for educational and informational purposes only. It is not personalized investment, legal, or tax advice. Consult a licensed financial professional before making decisions.";

/// Trait for verification rules
pub trait VerificationRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Risk severity if this rule fails
    fn risk_level(&self) -> RiskLevel;

    fn verify(&self, output: &str) -> VerificationCheckResult;
}

pub struct VerificationCheckResult {
    pub passed: bool,
    pub details: String,
}

/// Verification engine that enforces rules
pub struct VerificationEngine {
    rules: Vec<Box<dyn VerificationRule>>,
}

impl VerificationEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: Box<dyn VerificationRule>) {
        self.rules.push(rule);
    }

    pub fn verify(&self, output: &str) -> VerificationResult {
        let mut compliance_checks = Vec::with_capacity(self.rules.len());
        let mut issues = Vec::new();
        let mut max_risk = RiskLevel::Low;

        for rule in &self.rules {
            let result = rule.verify(output);

            if !result.passed {
                issues.push(format!("{}: {}", rule.name(), result.details));
                max_risk = std::cmp::max(max_risk, rule.risk_level());
            }

            compliance_checks.push(ComplianceCheck {
                rule_name: rule.name().to_string(),
                passed: result.passed,
                details: result.details,
            });
        }

        let verified = issues.is_empty();

        if verified {
            info!(rule_count = self.rules.len(), "Verification completed");
        } else {
            warn!(rule_count = self.rules.len(), ?issues, "Verification found issues");
        }

        VerificationResult {
            verified,
            risk_level: max_risk,
            compliance_checks,
            issues,
            verified_at: Utc::now(),
        }
    }
}

impl Default for VerificationEngine {
    fn default() -> Self {
        Self::new()
    }
}

//
// ========== Rules ==========
//

const DISCLAIMER_MARKERS: &[&str] = &[
    "disclaimer",
    "not financial advice",
    "not investment advice",
    "not personalized investment advice",
    "educational only",
    "educational purposes",
];

/// Rule: output must say it is not advice
pub struct DisclaimerPresentRule;

impl VerificationRule for DisclaimerPresentRule {
    fn name(&self) -> &'static str {
        DISCLAIMER_RULE
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::Medium
    }

    fn verify(&self, output: &str) -> VerificationCheckResult {
        let lowered = output.to_lowercase();
        let passed = DISCLAIMER_MARKERS.iter().any(|m| lowered.contains(m));

        VerificationCheckResult {
            passed,
            details: if passed {
                "Disclaimer language present".to_string()
            } else {
                "No disclaimer language found".to_string()
            },
        }
    }
}

const DIRECTIVE_PHRASES: &[&str] = &[
    "you should buy",
    "you should sell",
    "buy now",
    "sell now",
    "strong buy",
    "strong sell",
    "guaranteed return",
];

/// Rule: no direct buy/sell calls
pub struct NoDirectiveTradeLanguageRule;

impl VerificationRule for NoDirectiveTradeLanguageRule {
    fn name(&self) -> &'static str {
        "no_directive_trade_language"
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::High
    }

    fn verify(&self, output: &str) -> VerificationCheckResult {
        let lowered = output.to_lowercase();
        let found: Vec<&str> = DIRECTIVE_PHRASES
            .iter()
            .copied()
            .filter(|p| lowered.contains(p))
            .collect();

        VerificationCheckResult {
            passed: found.is_empty(),
            details: if found.is_empty() {
                "No directive trade language".to_string()
            } else {
                format!("Directive phrases found: {}", found.join(", "))
            },
        }
    }
}

/// Create a default verification engine with standard rules
pub fn create_default_verification_engine() -> VerificationEngine {
    let mut engine = VerificationEngine::new();
    engine.add_rule(Box::new(DisclaimerPresentRule));
    engine.add_rule(Box::new(NoDirectiveTradeLanguageRule));
    engine
}
