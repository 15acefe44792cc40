use financial_document_analyzer::{
    agent::default_agents,
    config::AppConfig,
    crew::Crew,
    llm::{LlmClient, MockLlm, OpenRouterClient},
    models::CrewInputs,
    task::default_tasks,
    tools::create_default_registry,
    verification::create_default_verification_engine,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_DOCUMENT: &str = "data/sample.pdf";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    // usage: analyzer [path/to/report.pdf] [query words...]
    let mut args = std::env::args().skip(1);
    let file_path = args.next().unwrap_or_else(|| DEFAULT_DOCUMENT.to_string());
    let query = args.collect::<Vec<_>>().join(" ");

    info!("Financial Document Analyzer starting");

    let (llm, max_document_chars): (Arc<dyn LlmClient>, usize) = match AppConfig::from_env() {
        Ok(config) => (
            Arc::new(OpenRouterClient::new(config.llm)?),
            config.max_document_chars,
        ),
        Err(e) => {
            warn!("{}", e);
            warn!("Falling back to the offline mock LLM");
            (Arc::new(MockLlm), 12_000)
        }
    };

    let crew = Crew::new(
        default_agents(),
        default_tasks(),
        llm,
        create_default_registry(),
        create_default_verification_engine(),
    )
    .with_max_document_chars(max_document_chars);

    let inputs = CrewInputs::new(Some(&query), file_path);

    info!(
        file = %inputs.file_path.display(),
        query = %inputs.query,
        "Running crew"
    );

    match crew.kickoff(inputs).await {
        Ok(output) => {
            info!("Analysis successful");
            println!("\n=== ANALYSIS ===\n");
            println!("{}", output);
            println!("\nRisk Level: {:?}", output.verification.risk_level);
            println!("Run ID: {}", output.run_id);
            println!("\nReasoning Trace:");
            for (i, trace) in output.reasoning_trace.iter().enumerate() {
                println!("  {}: {}", i + 1, trace);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Analysis failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
