//! Environment-driven configuration
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file. Only the LLM API key is mandatory.

use crate::error::AnalyzerError;
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Settings for the chat-completions client
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmSettings {
    /// Default model settings for the given API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: 800,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Document characters forwarded to each task prompt
    pub max_document_chars: usize,
    pub llm: LlmSettings,
}

impl AppConfig {
    /// Load `.env` (if present) and build the configuration from the environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let api_key = env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AnalyzerError::ConfigError(
                    "Missing OPENROUTER_API_KEY environment variable. Set it and restart."
                        .to_string(),
                )
            })?;

        let llm = LlmSettings {
            api_key,
            api_base: env::var("OPENROUTER_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            temperature: parse_var("LLM_TEMPERATURE", 0.2)?,
            max_tokens: parse_var("LLM_MAX_TOKENS", 800)?,
        };

        let port = match env::var("PORT").or_else(|_| env::var("API_PORT")) {
            Ok(raw) => parse_value("PORT", &raw)?,
            Err(_) => 8000,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            max_document_chars: parse_var("MAX_DOCUMENT_CHARS", 12_000)?,
            llm,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        AnalyzerError::ConfigError(format!("{} has an invalid value: {:?}", name, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        let port: u16 = parse_value("PORT", " 9000 ").unwrap();
        assert_eq!(port, 9000);

        let bad: Result<u16> = parse_value("PORT", "ninety");
        assert!(matches!(bad, Err(AnalyzerError::ConfigError(_))));
    }

    #[test]
    fn test_llm_defaults() {
        let settings = LlmSettings::with_api_key("key");
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.max_tokens, 800);
        assert!((settings.temperature - 0.2).abs() < f32::EPSILON);
    }
}
