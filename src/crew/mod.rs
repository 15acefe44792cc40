//! Crew - runs declared tasks through their agents
//!
//! LOAD → HEURISTICS → TASKS (sequential) → VERIFY → COMPLETE

use crate::agent::Agent;
use crate::error::AnalyzerError;
use crate::llm::LlmClient;
use crate::models::{CrewInputs, CrewOutput, TaskOutput};
use crate::task::Task;
use crate::tools::ToolRegistry;
use crate::verification::{VerificationEngine, DISCLAIMER_RULE, STANDARD_DISCLAIMER};
use crate::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

const TRUNCATION_MARKER: &str = "\n[...truncated]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Process {
    /// Tasks run one after another; each sees every earlier output
    #[default]
    Sequential,
}

/// Main crew that coordinates the entire workflow
pub struct Crew {
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    process: Process,
    llm: Arc<dyn LlmClient>,
    registry: ToolRegistry,
    verification_engine: VerificationEngine,
    max_document_chars: usize,
}

impl Crew {
    pub fn new(
        agents: Vec<Agent>,
        tasks: Vec<Task>,
        llm: Arc<dyn LlmClient>,
        registry: ToolRegistry,
        verification_engine: VerificationEngine,
    ) -> Self {
        Self {
            agents,
            tasks,
            process: Process::Sequential,
            llm,
            registry,
            verification_engine,
            max_document_chars: 12_000,
        }
    }

    pub fn with_max_document_chars(mut self, max_document_chars: usize) -> Self {
        self.max_document_chars = max_document_chars;
        self
    }

    pub fn process(&self) -> Process {
        self.process
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Run every task for the given document and query
    pub async fn kickoff(&self, inputs: CrewInputs) -> Result<CrewOutput> {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4();
        let mut reasoning_trace = Vec::new();

        info!(
            run_id = %run_id,
            file = %inputs.file_path.display(),
            query = %inputs.query,
            "Crew: starting run"
        );

        let assignments = self.assign_agents()?;
        reasoning_trace.push(format!(
            "INPUT: {} task(s), {:?} process",
            self.tasks.len(),
            self.process
        ));

        // === LOAD ===
        let document_text = self
            .run_text_tool(
                "read_financial_document",
                json!({ "path": inputs.file_path.to_string_lossy() }),
                "text",
            )
            .await;
        reasoning_trace.push(format!(
            "LOAD: {} chars extracted",
            document_text.chars().count()
        ));

        // === HEURISTICS ===
        let observations = self
            .run_text_tool(
                "investment_observations",
                json!({ "text": document_text }),
                "observations",
            )
            .await;
        let risk_flags = self
            .run_text_tool("risk_flags", json!({ "text": document_text }), "flags")
            .await;
        reasoning_trace.push("HEURISTICS: observations and risk flags computed".to_string());

        let base_context = self.base_context(&inputs, &document_text, &observations, &risk_flags);

        // === TASKS ===
        let mut tasks_output: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());

        for (task, agent) in self.tasks.iter().zip(assignments) {
            let context = with_prior_outputs(&base_context, &tasks_output);
            let task_start = Instant::now();

            debug!(task = task.name, role = ?agent.role, "Executing task");

            let raw = agent.execute(task, &context, self.llm.as_ref()).await?;

            reasoning_trace.push(format!(
                "TASK: {} ({}) - {} ms",
                task.name,
                agent.role,
                task_start.elapsed().as_millis()
            ));

            tasks_output.push(TaskOutput {
                task_name: task.name.to_string(),
                title: task.title.to_string(),
                agent_role: agent.role,
                raw,
            });
        }

        let mut raw = concatenate(&tasks_output);

        // === VERIFY ===
        let verification = self.verification_engine.verify(&raw);
        reasoning_trace.push(format!(
            "VERIFY: {} / {} rules passed",
            verification
                .compliance_checks
                .iter()
                .filter(|c| c.passed)
                .count(),
            verification.compliance_checks.len()
        ));

        if verification.failed(DISCLAIMER_RULE) {
            raw.push_str("\n\n");
            raw.push_str(STANDARD_DISCLAIMER);
            reasoning_trace.push("VERIFY: standard disclaimer appended".to_string());
        }

        reasoning_trace.push("COMPLETE: analysis assembled".to_string());

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            tasks = tasks_output.len(),
            risk = ?verification.risk_level,
            execution_time_ms,
            "Crew: run complete"
        );

        Ok(CrewOutput {
            run_id,
            raw,
            tasks_output,
            verification,
            reasoning_trace,
            execution_time_ms,
        })
    }

    /// Resolve each task's agent up front so a misconfigured crew fails before any LLM call
    fn assign_agents(&self) -> Result<Vec<&Agent>> {
        self.tasks
            .iter()
            .map(|task| {
                self.agents
                    .iter()
                    .find(|agent| agent.role == task.agent)
                    .ok_or_else(|| {
                        AnalyzerError::TaskError(format!(
                            "Task '{}' is assigned to {} which is not part of the crew",
                            task.name, task.agent
                        ))
                    })
            })
            .collect()
    }

    /// Tool failures become inline `[ERROR]` text for the agents to report
    async fn run_text_tool(&self, name: &str, parameters: Value, field: &str) -> String {
        match self.registry.execute(name, parameters).await {
            Ok(output) => output
                .data
                .get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("[ERROR] {} returned no '{}'", name, field)),
            Err(e) => {
                warn!(tool = name, error = %e, "Tool failed");
                format!("[ERROR] {}", e)
            }
        }
    }

    fn base_context(
        &self,
        inputs: &CrewInputs,
        document_text: &str,
        observations: &str,
        risk_flags: &str,
    ) -> String {
        let file_name = inputs
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        format!(
            "User query: {}\nFile: {}\n\nDocument text:\n{}\n\nHeuristic observations:\n{}\n\nHeuristic risk flags:\n{}",
            inputs.query,
            file_name,
            truncate_chars(document_text, self.max_document_chars),
            observations,
            risk_flags
        )
    }
}

fn with_prior_outputs(base: &str, prior: &[TaskOutput]) -> String {
    if prior.is_empty() {
        return base.to_string();
    }

    let mut context = base.to_string();
    context.push_str("\n\nOutputs of previous tasks:");
    for output in prior {
        context.push_str(&format!("\n\n[{}]\n{}", output.title, output.raw));
    }
    context
}

fn concatenate(outputs: &[TaskOutput]) -> String {
    outputs
        .iter()
        .map(|o| format!("## {}\n\n{}", o.title, o.raw.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{default_agents, financial_analyst};
    use crate::task::default_tasks;
    use crate::tools::{create_registry_with_extractor, TextExtractor};
    use crate::verification::create_default_verification_engine;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct PlainTextExtractor;

    impl TextExtractor for PlainTextExtractor {
        fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>> {
            Ok(vec![String::from_utf8_lossy(bytes).into_owned()])
        }
    }

    /// Answers with the role name and keeps every prompt
    struct RoleEchoLlm {
        prompts: Mutex<Vec<String>>,
        suffix: &'static str,
    }

    impl RoleEchoLlm {
        fn new(suffix: &'static str) -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                suffix,
            }
        }
    }

    #[async_trait]
    impl LlmClient for RoleEchoLlm {
        async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let role = system
                .lines()
                .find_map(|l| l.strip_prefix("You are acting as: "))
                .unwrap_or("unknown");
            Ok(format!("Output from {}{}", role, self.suffix))
        }
    }

    fn crew_with(llm: Arc<dyn LlmClient>) -> Crew {
        Crew::new(
            default_agents(),
            default_tasks(),
            llm,
            create_registry_with_extractor(Arc::new(PlainTextExtractor)),
            create_default_verification_engine(),
        )
    }

    fn write_document(text: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q3_report.pdf");
        std::fs::write(&path, text).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_kickoff_runs_tasks_in_order() {
        let llm = Arc::new(RoleEchoLlm::new(""));
        let crew = crew_with(llm.clone());
        let (_dir, path) = write_document("Income statement: revenue 40, going concern doubt");

        let output = crew
            .kickoff(CrewInputs::new(Some("Summarize"), &path))
            .await
            .unwrap();

        let names: Vec<&str> = output.tasks_output.iter().map(|t| t.task_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["verify_document", "analyze_financial_document", "investment_education"]
        );

        assert!(output.raw.starts_with("## Document Verification\n\nOutput from Document Verifier."));
        assert!(output.raw.contains("## Financial Analysis"));
        assert!(output.raw.contains("## Investment Education"));

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("User query: Summarize"));
        assert!(prompts[0].contains("File: q3_report.pdf"));
        assert!(prompts[0].contains("- Income Statement: Present"));
        assert!(prompts[0].contains("Going concern language found"));
        assert!(!prompts[0].contains("Outputs of previous tasks"));
        assert!(prompts[2].contains("[Document Verification]\nOutput from Document Verifier."));
        assert!(prompts[2].contains("[Financial Analysis]\nOutput from Financial Document Analyst."));
    }

    #[tokio::test]
    async fn test_disclaimer_appended_when_missing() {
        let crew = crew_with(Arc::new(RoleEchoLlm::new("")));
        let (_dir, path) = write_document("balance sheet");

        let output = crew.kickoff(CrewInputs::new(None, &path)).await.unwrap();

        assert!(output.verification.failed(DISCLAIMER_RULE));
        assert!(output.raw.ends_with(STANDARD_DISCLAIMER));
        assert!(output
            .reasoning_trace
            .iter()
            .any(|t| t == "VERIFY: standard disclaimer appended"));
    }

    #[tokio::test]
    async fn test_disclaimer_not_duplicated() {
        let crew = crew_with(Arc::new(RoleEchoLlm::new(". Disclaimer: educational only.")));
        let (_dir, path) = write_document("balance sheet");

        let output = crew.kickoff(CrewInputs::new(None, &path)).await.unwrap();

        assert!(output.verification.verified);
        assert!(!output.raw.contains(STANDARD_DISCLAIMER));
    }

    #[tokio::test]
    async fn test_missing_document_reported_to_agents() {
        let llm = Arc::new(RoleEchoLlm::new(""));
        let crew = crew_with(llm.clone());

        crew.kickoff(CrewInputs::new(None, "/nonexistent/file.pdf"))
            .await
            .unwrap();

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("[ERROR] File not found: /nonexistent/file.pdf"));
        assert!(prompts[0].contains("[InvestmentTool] Cannot analyze: [ERROR]"));
        assert!(prompts[0].contains("[RiskTool] Cannot analyze: [ERROR]"));
    }

    #[tokio::test]
    async fn test_unassigned_agent_fails_before_llm() {
        let llm = Arc::new(RoleEchoLlm::new(""));
        let crew = Crew::new(
            vec![financial_analyst()],
            default_tasks(),
            llm.clone(),
            create_registry_with_extractor(Arc::new(PlainTextExtractor)),
            create_default_verification_engine(),
        );

        let result = crew.kickoff(CrewInputs::new(None, "x.pdf")).await;
        assert!(matches!(result, Err(AnalyzerError::TaskError(_))));
        assert!(llm.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc\n[...truncated]");
        assert_eq!(truncate_chars("ééé", 2), "éé\n[...truncated]");
    }
}
