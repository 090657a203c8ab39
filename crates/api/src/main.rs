//! Escalation Pager - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "pager.toml".to_string());
    let config = AppConfig::load(&path)
        .with_context(|| format!("failed to load configuration from {}", path))?;

    init_logging(&config.logging)?;

    info!("=== Escalation Pager v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Loaded {} escalation policies from {}", config.policies.len(), path);

    run_server(config).await?;

    Ok(())
}
