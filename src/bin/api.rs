use financial_document_analyzer::{
    agent::default_agents,
    api::{start_server, ApiState},
    config::AppConfig,
    crew::Crew,
    llm::OpenRouterClient,
    task::default_tasks,
    tools::create_default_registry,
    verification::create_default_verification_engine,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    info!("🚀 Financial Document Analyzer - API Server");
    info!("📍 Address: {}", config.bind_address());
    info!("🤖 Model: {}", config.llm.model);

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    // Create components
    let llm = Arc::new(OpenRouterClient::new(config.llm.clone())?);
    let crew = Crew::new(
        default_agents(),
        default_tasks(),
        llm,
        create_default_registry(),
        create_default_verification_engine(),
    )
    .with_max_document_chars(config.max_document_chars);

    info!("✅ Crew initialized with {} task(s)", crew.tasks().len());
    info!("📡 Starting API server...");

    let state = ApiState {
        crew: Arc::new(crew),
        upload_dir: config.upload_dir.clone(),
        max_upload_bytes: config.max_upload_bytes,
    };

    start_server(state, &config.bind_address()).await?;

    Ok(())
}
