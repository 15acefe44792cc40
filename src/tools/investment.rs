//! Heuristic, non-actionable observations about financial statement coverage

use serde_json::json;

use super::{require_str, Tool};
use crate::models::{ToolInput, ToolOutput};
use crate::Result;

/// Keyword lists per statement category, in report order
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Balance Sheet",
        &["balance sheet", "total assets", "total liabilities", "shareholders' equity", "equity"],
    ),
    (
        "Income Statement",
        &["income statement", "profit", "revenue", "net income", "earnings"],
    ),
    (
        "Cash Flow",
        &["cash flow", "operating activities", "investing activities", "financing activities"],
    ),
    (
        "Ratios",
        &["debt", "debt-to-equity", "current ratio", "gross margin", "operating margin", "ebitda"],
    ),
];

const DISCLAIMER: &str = "\nDisclaimer: These are high-level observations only. This tool does NOT provide personalized investment advice. Consult a licensed financial professional for decisions.";

/// Which statement categories appear in the text, in report order
pub fn detect_categories(lowered: &str) -> Vec<(&'static str, bool)> {
    CATEGORIES
        .iter()
        .map(|(title, keywords)| (*title, keywords.iter().any(|kw| lowered.contains(kw))))
        .collect()
}

pub struct InvestmentTool;

impl InvestmentTool {
    /// Report which financial statements appear to be present plus a few
    /// conservative heuristics. Never produces buy/sell advice.
    pub fn summarize_financials(text: &str) -> String {
        if text.is_empty() || text.starts_with("[ERROR]") {
            return format!("[InvestmentTool] Cannot analyze: {}", text);
        }

        let lowered = text.to_lowercase();
        let found = detect_categories(&lowered);

        let mut observations = vec!["Summary of detected content:".to_string()];
        for (title, present) in &found {
            observations.push(format!(
                "- {}: {}",
                title,
                if *present { "Present" } else { "Not detected" }
            ));
        }

        let balance_sheet = found[0].1;
        if balance_sheet
            && lowered.contains("total liabilities")
            && lowered.contains("total assets")
        {
            observations.push(
                "- Heuristic: Balance sheet items detected. Consider checking asset/liability breakdowns for unusual lines."
                    .to_string(),
            );
        }
        if lowered.contains("auditor") || lowered.contains("audited") {
            observations.push(
                "- Auditor language detected. Check for audit opinions or qualifications.".to_string(),
            );
        }
        if lowered.contains("restatement") || lowered.contains("restate") {
            observations.push(
                "- Restatement language detected — investigate accounting changes.".to_string(),
            );
        }
        if !found.iter().any(|(_, present)| *present) {
            observations.push(
                "- No obvious financial statements detected in the text. The file may be a summary or a non-financial document."
                    .to_string(),
            );
        }

        observations.push(DISCLAIMER.to_string());
        observations.join("\n")
    }
}

#[async_trait::async_trait]
impl Tool for InvestmentTool {
    fn name(&self) -> &'static str {
        "investment_observations"
    }

    fn description(&self) -> &'static str {
        "Detect financial statement coverage and produce non-actionable observations"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let text = require_str(input, "text")?;

        Ok(ToolOutput {
            success: true,
            data: json!({ "observations": Self::summarize_financials(text) }),
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_on_error_text() {
        assert_eq!(
            InvestmentTool::summarize_financials("[ERROR] File not found: x.pdf"),
            "[InvestmentTool] Cannot analyze: [ERROR] File not found: x.pdf"
        );
        assert_eq!(
            InvestmentTool::summarize_financials(""),
            "[InvestmentTool] Cannot analyze: "
        );
    }

    #[test]
    fn test_detects_statements() {
        let text = "CONSOLIDATED BALANCE SHEET\nTotal Assets 1,200\nTotal Liabilities 700\n\
                    Statement of Cash Flows: cash flow from operating activities";
        let summary = InvestmentTool::summarize_financials(text);

        assert!(summary.starts_with("Summary of detected content:"));
        assert!(summary.contains("- Balance Sheet: Present"));
        assert!(summary.contains("- Income Statement: Not detected"));
        assert!(summary.contains("- Cash Flow: Present"));
        assert!(summary.contains("- Heuristic: Balance sheet items detected."));
        assert!(summary.contains("Disclaimer:"));
        assert!(!summary.contains("No obvious financial statements"));
    }

    #[test]
    fn test_audit_and_restatement_language() {
        let summary = InvestmentTool::summarize_financials(
            "The auditor noted that prior periods were restated.",
        );
        assert!(summary.contains("Auditor language detected"));
        assert!(summary
            .contains("\n- Restatement language detected — investigate accounting changes.\n"));
    }

    #[test]
    fn test_execute_wraps_summary() {
        let input = ToolInput {
            tool_name: "investment_observations".to_string(),
            parameters: json!({ "text": "EBITDA and gross margin improved" }),
        };

        let output = tokio_test::block_on(InvestmentTool.execute(&input)).unwrap();
        assert!(output.success);
        assert!(output.data["observations"]
            .as_str()
            .unwrap()
            .contains("- Ratios: Present"));
    }

    #[test]
    fn test_non_financial_text() {
        let summary = InvestmentTool::summarize_financials("A recipe for lemon cake.");
        assert!(summary.contains("- Ratios: Not detected"));
        assert!(summary.contains("No obvious financial statements detected"));
    }
}
