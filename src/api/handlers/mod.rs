//! API request handlers
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::Json;

use crate::api::types::ApiResponse;
use crate::api::types::HealthResponse;
use crate::llm::TextModel;
use crate::logging::EventLog;

pub mod flashcards;

pub use flashcards::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn TextModel>,
    pub event_log: EventLog,
    /// Longest a single generation stream may run
    pub max_duration: Duration,
}

impl AppState {
    pub fn new(model: Arc<dyn TextModel>, event_log: EventLog, max_duration: Duration) -> Self {
        Self {
            model,
            event_log,
            max_duration,
        }
    }
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.model.model_id().to_string(),
    }))
}
