//! Agent declarations and prompt execution
//!
//! An agent is a role-scoped prompt template over the shared LLM client.
//! Each agent carries its own requests-per-minute budget.

use crate::error::AnalyzerError;
use crate::llm::{LlmClient, SYSTEM_MESSAGE};
use crate::models::AgentRole;
use crate::task::Task;
use crate::Result;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const RPM_WINDOW: Duration = Duration::from_secs(60);

pub struct Agent {
    pub role: AgentRole,
    pub goal: &'static str,
    pub backstory: &'static str,
    /// Upper bound on LLM calls spent trying to get a non-blank answer
    pub max_iter: u32,
    pub max_rpm: u32,
    pub allow_delegation: bool,
    limiter: RpmLimiter,
}

impl Agent {
    pub fn new(
        role: AgentRole,
        goal: &'static str,
        backstory: &'static str,
        max_iter: u32,
        max_rpm: u32,
    ) -> Self {
        Self {
            role,
            goal,
            backstory,
            max_iter: max_iter.max(1),
            max_rpm,
            allow_delegation: false,
            limiter: RpmLimiter::new(max_rpm),
        }
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "{}\n\nYou are acting as: {}.\nGoal: {}\nBackstory: {}",
            SYSTEM_MESSAGE, self.role, self.goal, self.backstory
        )
    }

    pub fn task_prompt(task: &Task, context: &str) -> String {
        format!(
            "{}\n\nExpected output:\n{}\n\nContext:\n{}",
            task.description, task.expected_output, context
        )
    }

    /// Run a task through the LLM and return the assistant text
    pub async fn execute(&self, task: &Task, context: &str, llm: &dyn LlmClient) -> Result<String> {
        let system = self.system_prompt();
        let prompt = Self::task_prompt(task, context);

        for attempt in 1..=self.max_iter {
            self.limiter.acquire().await;

            debug!(role = ?self.role, task = task.name, attempt, "Agent prompting LLM");
            let answer = llm.generate(&system, &prompt).await?;

            if !answer.trim().is_empty() {
                info!(
                    role = ?self.role,
                    task = task.name,
                    chars = answer.len(),
                    "Agent completed task"
                );
                return Ok(answer);
            }

            warn!(role = ?self.role, task = task.name, attempt, "Blank answer from LLM");
        }

        Err(AnalyzerError::TaskError(format!(
            "{} returned no answer for '{}' after {} attempt(s)",
            self.role, task.name, self.max_iter
        )))
    }
}

/// Fixed one-minute window; callers beyond the budget wait for the next window
struct RpmLimiter {
    max_rpm: u32,
    window: Mutex<Window>,
}

struct Window {
    started: Instant,
    count: u32,
}

impl RpmLimiter {
    fn new(max_rpm: u32) -> Self {
        Self {
            max_rpm,
            window: Mutex::new(Window {
                started: Instant::now(),
                count: 0,
            }),
        }
    }

    async fn acquire(&self) {
        if self.max_rpm == 0 {
            return;
        }

        let mut window = self.window.lock().await;

        if window.started.elapsed() >= RPM_WINDOW {
            window.started = Instant::now();
            window.count = 0;
        }

        if window.count >= self.max_rpm {
            let wait = RPM_WINDOW.saturating_sub(window.started.elapsed());
            warn!(max_rpm = self.max_rpm, wait_ms = wait.as_millis() as u64, "RPM budget exhausted");
            tokio::time::sleep(wait).await;
            window.started = Instant::now();
            window.count = 0;
        }

        window.count += 1;
    }
}

//
// ========== Agent declarations ==========
//

pub fn financial_analyst() -> Agent {
    Agent::new(
        AgentRole::FinancialAnalyst,
        "Read the supplied financial document carefully, summarize the key financial statements and metrics, \
         highlight potential data issues or anomalies, and provide high-level observations. \
         Do NOT provide personalized investment or legal advice. \
         Recommend consulting a licensed professional for actionable decisions.",
        "You're a cautious and competent financial analyst. Your aim is to produce clear summaries, \
         flag questionable items, note assumptions, and explain uncertainty. Do not invent facts. \
         If the document lacks information, state that explicitly.",
        3,
        60,
    )
}

pub fn verifier() -> Agent {
    Agent::new(
        AgentRole::Verifier,
        "Determine whether the uploaded file is a financial document and summarize the evidence for that decision \
         (e.g., presence of balance sheet, income statement, cash flow, line items, accounting dates). \
         If not a financial doc, explain why. Do not blindly approve documents.",
        "You are trained to verify document types by looking for structural clues and common financial terms. \
         When uncertain, ask for clarification or report missing evidence.",
        2,
        60,
    )
}

pub fn investment_advisor() -> Agent {
    Agent::new(
        AgentRole::InvestmentAdvisor,
        "Provide general, educational information about investment concepts relevant to the document \
         (e.g., what a high debt-to-equity ratio means generally). Include an explicit disclaimer that \
         this is educational only and not financial advice.",
        "You explain investment concepts in plain English and avoid making specific buy/sell calls.",
        2,
        60,
    )
}

pub fn default_agents() -> Vec<Agent> {
    vec![verifier(), financial_analyst(), investment_advisor()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::analyze_financial_document_task;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    /// Replays canned answers and records every prompt it receives
    struct ScriptedLlm {
        answers: StdMutex<VecDeque<String>>,
        prompts: StdMutex<Vec<(String, String)>>,
    }

    impl ScriptedLlm {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: StdMutex::new(answers.iter().map(|a| a.to_string()).collect()),
                prompts: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((system.to_string(), prompt.to_string()));
            Ok(self.answers.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn test_execute_builds_prompts() {
        let llm = ScriptedLlm::new(&["Executive summary: stable."]);
        let agent = financial_analyst();
        let task = analyze_financial_document_task();

        let answer = agent
            .execute(&task, "Document text:\nRevenue 10", &llm)
            .await
            .unwrap();
        assert_eq!(answer, "Executive summary: stable.");

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        let (system, prompt) = &prompts[0];
        assert!(system.starts_with(SYSTEM_MESSAGE));
        assert!(system.contains("Financial Document Analyst"));
        assert!(prompt.starts_with(task.description));
        assert!(prompt.ends_with("Document text:\nRevenue 10"));
    }

    #[tokio::test]
    async fn test_blank_answer_reprompts_until_max_iter() {
        let llm = ScriptedLlm::new(&["", "  ", "Third time lucky"]);
        let agent = financial_analyst();

        let answer = agent
            .execute(&analyze_financial_document_task(), "", &llm)
            .await
            .unwrap();
        assert_eq!(answer, "Third time lucky");
        assert_eq!(llm.prompts.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_blank_answers_exhaust_budget() {
        let llm = ScriptedLlm::new(&[]);
        let agent = verifier();

        let result = agent
            .execute(&analyze_financial_document_task(), "", &llm)
            .await;
        assert!(matches!(result, Err(AnalyzerError::TaskError(_))));
        assert_eq!(llm.prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_limiter_within_budget_does_not_wait() {
        let limiter = RpmLimiter::new(3);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(limiter.window.lock().await.count, 3);
    }

    #[test]
    fn test_declarations() {
        let agents = default_agents();
        assert_eq!(agents.len(), 3);
        assert!(agents.iter().all(|a| a.max_rpm == 60 && !a.allow_delegation));
        assert_eq!(financial_analyst().max_iter, 3);
        assert_eq!(investment_advisor().max_iter, 2);
    }
}
