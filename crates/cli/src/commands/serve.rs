//! `mendbot serve` — start the webhook gateway.

use mendbot_config::AppConfig;

pub async fn run(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    config.validate()?;

    if let Some(port) = port {
        config.gateway.port = port;
    }

    mendbot_gateway::start(config).await
}
