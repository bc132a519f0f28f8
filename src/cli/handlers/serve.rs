//! API server handlers

use crate::api::server::state_from_config;
use crate::api::serve_api;
use crate::AppConfig;
use crate::Result;

pub async fn handle_serve_api(
    config: &AppConfig,
    host: Option<String>,
    port: Option<u16>,
    cors: bool,
) -> Result<()> {
    // CLI arguments take priority over config
    let mut config = config.clone();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.server.enable_cors |= cors;

    println!("🚀 Starting flashgen API Server");
    println!("===============================\n");
    println!("📍 Host: {}", config.server.host);
    println!("🔌 Port: {}", config.server.port);
    println!(
        "🌐 CORS: {}",
        if config.server.enable_cors {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    println!("🤖 Model: {}", config.llm_model());
    println!("📝 Event log: {}", config.logging.event_log_path.display());
    println!();

    let state = state_from_config(&config)?;
    serve_api(&config, state).await?;

    Ok(())
}
