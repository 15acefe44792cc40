//! Tool trait and registry
//!
//! Tools are deterministic helpers the crew runs before prompting agents:
//! document loading plus keyword heuristics over the extracted text.

use crate::error::AnalyzerError;
use crate::models::{ToolInput, ToolOutput};
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;

pub mod document;
pub mod investment;
pub mod risk;

pub use document::{FinancialDocumentTool, PdfTextExtractor, TextExtractor};
pub use investment::InvestmentTool;
pub use risk::RiskTool;

/// Trait for a single tool (deterministic execution)
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput>;
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Look up and run a tool by name
    pub async fn execute(&self, name: &str, parameters: serde_json::Value) -> Result<ToolOutput> {
        let tool = self
            .get(name)
            .ok_or_else(|| AnalyzerError::ToolNotFound(name.to_string()))?;

        let input = ToolInput {
            tool_name: name.to_string(),
            parameters,
        };

        tool.execute(&input).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn require_str<'a>(input: &'a ToolInput, key: &str) -> Result<&'a str> {
    input
        .parameters
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            AnalyzerError::InvalidToolInput(format!(
                "{} expects a string '{}' in tool_input",
                input.tool_name, key
            ))
        })
}

/// Registry with the document reader and both heuristic tools
pub fn create_default_registry() -> ToolRegistry {
    create_registry_with_extractor(Arc::new(PdfTextExtractor))
}

pub fn create_registry_with_extractor(extractor: Arc<dyn TextExtractor>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(FinancialDocumentTool::new(extractor)));
    registry.register(Arc::new(InvestmentTool));
    registry.register(Arc::new(RiskTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_registry_contents() {
        let registry = create_default_registry();
        assert_eq!(
            registry.list(),
            vec!["investment_observations", "read_financial_document", "risk_flags"]
        );
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let registry = create_default_registry();
        let result = registry.execute("web_search", json!({})).await;
        assert!(matches!(result, Err(AnalyzerError::ToolNotFound(_))));
    }

    #[tokio::test]
    async fn test_execute_rejects_missing_parameter() {
        let registry = create_default_registry();
        let result = registry.execute("risk_flags", json!({ "body": "x" })).await;
        assert!(matches!(result, Err(AnalyzerError::InvalidToolInput(_))));
    }

    #[tokio::test]
    async fn test_execute_heuristic_tool() {
        let registry = create_default_registry();
        let output = registry
            .execute("risk_flags", json!({ "text": "related party loans" }))
            .await
            .unwrap();

        assert!(output.success);
        assert!(output.data["flags"]
            .as_str()
            .unwrap()
            .starts_with("Related party transactions mentioned"));
    }
}
