//! Task declarations
//!
//! A task is one prompt-execution step assigned to an agent role.
//! Crews run them in declaration order.

use crate::models::AgentRole;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: &'static str,
    /// Section heading used when outputs are concatenated
    pub title: &'static str,
    pub description: &'static str,
    pub expected_output: &'static str,
    pub agent: AgentRole,
}

pub fn verify_document_task() -> Task {
    Task {
        name: "verify_document",
        title: "Document Verification",
        description: "Verify whether the uploaded file appears to be a financial report. \
            Return a short judgment (Yes/No) and the evidence (terms/sections) that support the judgment. \
            If not a financial document, explain why.",
        expected_output: "A JSON-like or bullet summary: {'is_financial_document': bool, 'evidence': [...], 'notes': '...'}\n\
            Keep it concise and factual.",
        agent: AgentRole::Verifier,
    }
}

pub fn analyze_financial_document_task() -> Task {
    Task {
        name: "analyze_financial_document",
        title: "Financial Analysis",
        description: "Read the financial document at the provided file path and produce a careful, high-level analysis. \
            Include: (1) short executive summary, (2) detected statements (balance sheet/income/cash flow), \
            (3) top 5 observations, (4) data quality issues or missing data, (5) recommended next steps (non-actionable). \
            Do NOT give personalized buy/sell recommendations.",
        expected_output: "Structured analysis with clear sections, bullet points for observations, \
            and explicit limitations/disclaimer.",
        agent: AgentRole::FinancialAnalyst,
    }
}

pub fn investment_education_task() -> Task {
    Task {
        name: "investment_education",
        title: "Investment Education",
        description: "Based on the financial analysis, provide high-level educational context about metrics that matter \
            (e.g., what a declining gross margin typically implies). \
            This must be explicitly non-actionable and include a disclaimer.",
        expected_output: "Clear, plain-language explanations of financial metrics and what they generally imply.",
        agent: AgentRole::InvestmentAdvisor,
    }
}

/// Verify → analyze → educate
pub fn default_tasks() -> Vec<Task> {
    vec![
        verify_document_task(),
        analyze_financial_document_task(),
        investment_education_task(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_task_order() {
        let roles: Vec<AgentRole> = default_tasks().iter().map(|t| t.agent).collect();
        assert_eq!(
            roles,
            vec![
                AgentRole::Verifier,
                AgentRole::FinancialAnalyst,
                AgentRole::InvestmentAdvisor
            ]
        );
    }

    #[test]
    fn test_descriptions_forbid_trade_calls() {
        assert!(analyze_financial_document_task()
            .description
            .contains("Do NOT give personalized buy/sell recommendations."));
        assert!(investment_education_task()
            .description
            .contains("non-actionable"));
    }
}
