//! Financial Document Analyzer
//!
//! Accepts an uploaded financial PDF and produces a structured,
//! non-actionable analysis:
//! - Extracts and cleans the document text
//! - Runs keyword heuristics for statement coverage and risk language
//! - Runs a sequential crew of LLM agents (verifier, analyst, educator)
//! - Checks the combined output for disclaimer and directive language
//!
//! PIPELINE:
//! UPLOAD → LOAD → HEURISTICS → VERIFY DOC → ANALYZE → EDUCATE → COMPLIANCE → RESPOND

pub mod agent;
pub mod api;
pub mod config;
pub mod crew;
pub mod error;
pub mod llm;
pub mod models;
pub mod task;
pub mod tools;
pub mod verification;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use crew::{Crew, Process};
