//! One-shot analysis from the command line.
//!
//! Usage: `advisor [profile.json]`. Without a path a sample profile is used.

use finance_advisor::{
    agent::Orchestrator, config::AppConfig, generation::client_from_config, FinancialProfile,
    ProfileRequest,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn sample_profile() -> finance_advisor::Result<FinancialProfile> {
    FinancialProfile::builder(50000.0)
        .expense("rent", 20000.0)
        .expense("utilities", 3000.0)
        .expense("groceries", 5000.0)
        .expense("entertainment", 2500.0)
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = client_from_config(&config.generation)?;
    let orchestrator = Orchestrator::new(client, &config.generation);

    let report = match std::env::args().nth(1) {
        Some(path) => {
            info!(path = %path, "Reading profile");
            let raw = std::fs::read_to_string(&path)?;
            let request: ProfileRequest = serde_json::from_str(&raw)?;
            orchestrator.analyze_request(request).await?
        }
        None => {
            info!("No profile given - analyzing sample profile");
            orchestrator.analyze(&sample_profile()?).await
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
