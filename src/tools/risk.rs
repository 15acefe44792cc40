//! Textual red-flag detection

use serde_json::json;

use super::{require_str, Tool};
use crate::models::{ToolInput, ToolOutput};
use crate::Result;

/// (any of these phrases, flag text)
const RISK_RULES: &[(&[&str], &str)] = &[
    (
        &["going concern"],
        "Going concern language found — the company may have liquidity or solvency concerns.",
    ),
    (
        &["significant uncertainty", "material uncertainty"],
        "Material uncertainty language present — review management discussion carefully.",
    ),
    (
        &["restated", "restatement"],
        "Historical restatements detected — check prior period comparatives.",
    ),
    (
        &["related party"],
        "Related party transactions mentioned — examine for potential conflicts of interest.",
    ),
    (
        &["litigation", "lawsuit"],
        "Litigation references found — assess potential contingent liabilities.",
    ),
];

const NO_FLAGS: &str = "No high-confidence textual risk flags detected with simple heuristics. This does not imply no risk exists; use thorough quantitative analysis for risk assessment.";

const DISCLAIMER: &str = "\nDisclaimer: These are heuristic flags based on text presence only. They are not a substitute for a full forensic review.";

pub struct RiskTool;

impl RiskTool {
    pub fn flag_risks(text: &str) -> String {
        if text.is_empty() || text.starts_with("[ERROR]") {
            return format!("[RiskTool] Cannot analyze: {}", text);
        }

        let lowered = text.to_lowercase();
        let mut flags: Vec<&str> = RISK_RULES
            .iter()
            .filter(|(phrases, _)| phrases.iter().any(|p| lowered.contains(p)))
            .map(|(_, flag)| *flag)
            .collect();

        if flags.is_empty() {
            flags.push(NO_FLAGS);
        }

        flags.push(DISCLAIMER);
        flags.join("\n")
    }
}

#[async_trait::async_trait]
impl Tool for RiskTool {
    fn name(&self) -> &'static str {
        "risk_flags"
    }

    fn description(&self) -> &'static str {
        "Highlight potential red flags in financial text"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let text = require_str(input, "text")?;

        Ok(ToolOutput {
            success: true,
            data: json!({ "flags": Self::flag_risks(text) }),
            error: None,
        })
    }
}
