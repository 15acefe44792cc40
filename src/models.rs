//! Core data models for the document analyzer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_QUERY: &str = "Analyze this financial document for investment insights";

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Verifier,
    FinancialAnalyst,
    InvestmentAdvisor,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

//
// ================= Crew I/O =================
//

/// Inputs interpolated into every task of a crew run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewInputs {
    pub query: String,
    pub file_path: PathBuf,
}

impl CrewInputs {
    /// Trimmed query, falling back to the default when blank
    pub fn new(query: Option<&str>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            query: normalize_query(query),
            file_path: file_path.into(),
        }
    }
}

pub fn normalize_query(query: Option<&str>) -> String {
    match query.map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => DEFAULT_QUERY.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    pub task_name: String,
    pub title: String,
    pub agent_role: AgentRole,
    pub raw: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewOutput {
    pub run_id: uuid::Uuid,
    pub raw: String,
    pub tasks_output: Vec<TaskOutput>,
    pub verification: VerificationResult,
    pub reasoning_trace: Vec<String>,
    pub execution_time_ms: u64,
}

impl fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

//
// ================= Verification =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    pub risk_level: RiskLevel,
    pub compliance_checks: Vec<ComplianceCheck>,
    pub issues: Vec<String>,
    pub verified_at: DateTime<Utc>,
}

impl VerificationResult {
    pub fn failed(&self, rule_name: &str) -> bool {
        self.compliance_checks
            .iter()
            .any(|c| c.rule_name == rule_name && !c.passed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub rule_name: String,
    pub passed: bool,
    pub details: String,
}

//
// ================= Tool I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub tool_name: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub data: serde_json::Value,
    pub error: Option<String>,
}

//
// ================= HTTP Response =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub status: String,
    pub query: String,
    pub analysis: String,
    pub file_processed: String,
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentRole::Verifier => "Document Verifier",
            AgentRole::FinancialAnalyst => "Financial Document Analyst",
            AgentRole::InvestmentAdvisor => "High-level Investment Educator (non-actionable)",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_normalization() {
        assert_eq!(normalize_query(None), DEFAULT_QUERY);
        assert_eq!(normalize_query(Some("   ")), DEFAULT_QUERY);
        assert_eq!(normalize_query(Some("  What is EBITDA? ")), "What is EBITDA?");
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert_eq!(std::cmp::max(RiskLevel::Low, RiskLevel::Medium), RiskLevel::Medium);
    }
}
