use finance_advisor::{
    agent::Orchestrator, api::start_server, config::AppConfig, generation::client_from_config,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (reads .env first)
    let config = AppConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Finance Advisor - API Server");
    info!(
        port = config.server.port,
        model = %config.generation.model,
        generation = config.generation.has_api_key(),
        "Configuration loaded"
    );

    let client = client_from_config(&config.generation)?;
    let orchestrator = Arc::new(Orchestrator::new(client, &config.generation));

    info!("Orchestrator initialized");

    start_server(orchestrator, config.server.port).await?;

    Ok(())
}
