//! HTTP server implementation

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::llm::GeminiClient;
use crate::llm::TextModel;
use crate::logging::EventLog;
use crate::Result;

/// Build state backed by Gemini and the configured event log
pub fn state_from_config(config: &AppConfig) -> Result<AppState> {
    let model: Arc<dyn TextModel> = Arc::new(GeminiClient::from_config(config)?);
    Ok(AppState::new(
        model,
        EventLog::new(&config.logging.event_log_path),
        config.max_duration(),
    ))
}

/// Start the API server and run until Ctrl+C or SIGTERM
pub async fn serve_api(config: &AppConfig, state: AppState) -> Result<()> {
    info!("Starting flashgen API server...");

    let model_id = state.model.model_id().to_string();
    let app = routes::build_router(state, config.server.enable_cors);
    if config.server.enable_cors {
        info!("CORS enabled");
    }

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;

    info!("API server listening on http://{addr}");
    info!("Model: {model_id}");
    info!("Available endpoints:");
    info!("  GET  /api/health              - Health check");
    info!("  POST /api/generate-flashcards - Stream flashcards for a topic");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
