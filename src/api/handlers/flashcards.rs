//! Flashcard generation handler
use axum::body::Body;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;
use futures::StreamExt;
use http::header::CACHE_CONTROL;
use http::header::CONTENT_TYPE;
use http::HeaderValue;
use serde_json::json;
use tracing::warn;

use super::AppState;
use crate::api::error::ApiError;
use crate::api::types::GenerateFlashcardsRequest;
use crate::llm::build_flashcard_prompt;
use crate::llm::StreamingResponse;
use crate::Result;

/// POST /api/generate-flashcards
///
/// Streams the model's raw JSON text back as it is produced. Anything that
/// fails before the first byte becomes a 500 with a fixed message; a
/// failure after that ends the body early.
pub async fn generate_flashcards(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<Response, ApiError> {
    state
        .event_log
        .info("API route called: generate-flashcards", None)
        .await;

    let stream = match start_generation(&state, &body).await {
        Ok(stream) => stream,
        Err(e) => {
            state
                .event_log
                .error(
                    "Error generating flashcards",
                    Some(json!({ "error": e.to_string() })),
                )
                .await;
            return Err(ApiError::GenerationFailed);
        }
    };

    let body = stream
        .with_deadline(state.max_duration)
        .into_stream()
        .inspect(|item| {
            if let Err(e) = item {
                warn!("Flashcard stream ended with error: {e}");
            }
        });

    let mut response = Response::new(Body::from_stream(body));
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Ok(response)
}

async fn start_generation(state: &AppState, body: &[u8]) -> Result<StreamingResponse> {
    let req: GenerateFlashcardsRequest = serde_json::from_slice(body)?;
    let count = req.effective_count();
    let grade = req.effective_grade();

    state
        .event_log
        .info(
            "Request received for topic",
            Some(json!({
                "topic": req.topic,
                "numFlashcards": count,
                "gradeLevel": grade.as_str(),
            })),
        )
        .await;

    state
        .event_log
        .debug("Initializing Gemini model with search grounding", None)
        .await;

    let prompt = build_flashcard_prompt(&req.topic, count, grade);
    let stream = state.model.stream_text(&req.api_key, &prompt).await?;

    state
        .event_log
        .info("Streaming flashcards generation started", None)
        .await;

    Ok(stream)
}
