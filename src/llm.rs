//! Chat-completions client used by every agent
//!
//! Talks to an OpenAI-compatible endpoint (OpenRouter by default).
//! Uses a long-lived reqwest::Client for connection pooling.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::config::LlmSettings;
use crate::error::AnalyzerError;
use crate::Result;

/// System message shared by all agents
pub const SYSTEM_MESSAGE: &str = "You are a helpful assistant specialized in financial document analysis. Be cautious, cite uncertainty, and do NOT provide personalized investment advice.";

/// Anything that can turn a prompt into assistant text
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Reusable OpenRouter client (connection-pooled)
pub struct OpenRouterClient {
    client: Client,
    settings: LlmSettings,
    endpoint: String,
}

impl OpenRouterClient {
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(120))
            .build()?;

        let endpoint = format!(
            "{}/chat/completions",
            settings.api_base.trim_end_matches('/')
        );

        Ok(Self {
            client,
            settings,
            endpoint,
        })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn build_request<'a>(&'a self, system: &'a str, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
        if self.settings.api_key.is_empty() {
            return Err(AnalyzerError::LlmError(
                "OPENROUTER_API_KEY not configured".to_string(),
            ));
        }

        let request = self.build_request(system, prompt);

        debug!(model = %self.settings.model, prompt_chars = prompt.len(), "Calling chat completions");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Chat completion request failed: {}", e);
                AnalyzerError::LlmError(format!("Chat completion request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Chat completion error response: {}", error_text);
            return Err(AnalyzerError::LlmError(format!(
                "Chat completion API returned {}: {}",
                status, error_text
            )));
        }

        let completion: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse chat completion: {}", e);
            AnalyzerError::LlmError(format!("Chat completion parse error: {}", e))
        })?;

        first_choice_text(completion)
    }
}

/// Offline client for development & testing
/// Keeps the pipeline functional without network access
pub struct MockLlm;

#[async_trait]
impl LlmClient for MockLlm {
    async fn generate(&self, _system: &str, prompt: &str) -> Result<String> {
        let first_line: String = prompt
            .lines()
            .next()
            .unwrap_or_default()
            .chars()
            .take(120)
            .collect();

        Ok(format!(
            "[offline] No language model configured. Task: {}\n\nThis is educational information only, not financial advice.",
            first_line
        ))
    }
}

fn first_choice_text(completion: ChatResponse) -> Result<String> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AnalyzerError::LlmError("No choices in chat completion".to_string()))?;

    if let Some(reason) = choice.finish_reason.as_deref() {
        debug!(finish_reason = reason, "Chat completion finished");
    }

    Ok(choice.message.content.unwrap_or_default().trim().to_string())
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
