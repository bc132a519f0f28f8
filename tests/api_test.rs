use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::body::to_bytes;
use axum::Router;
use flashgen::api::build_router;
use flashgen::api::types::ErrorResponse;
use flashgen::api::AppState;
use flashgen::llm::mock::MockEnding;
use flashgen::llm::FlashcardPrompts;
use flashgen::llm::MockModel;
use flashgen::logging::EventLog;
use flashgen::models::Flashcard;
use flashgen::models::FlashcardDeck;
use flashgen::models::GradeLevel;
use flashgen::Result;
use http::header::CONTENT_TYPE;
use http::Request;
use http::StatusCode;
use serde_json::json;
use serde_json::Value;
use tower::ServiceExt;

fn cards() -> Vec<Flashcard> {
    vec![
        Flashcard::new("Chlorophyll", "Green pigment that captures sunlight."),
        Flashcard::new("Stomata", "Tiny holes in leaves that let air in and out."),
        Flashcard::new("Glucose", "Sugar that plants make for food."),
    ]
}

fn router(model: Arc<MockModel>, event_log: EventLog) -> Router {
    build_router(
        AppState::new(model, event_log, Duration::from_secs(30)),
        false,
    )
}

fn generate_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/generate-flashcards")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_streams_raw_json_text() -> Result<()> {
    let model = Arc::new(MockModel::with_cards(&cards(), 9));
    let app = router(model.clone(), EventLog::disabled());

    let response = app
        .oneshot(generate_request(&json!({
            "topic": "Photosynthesis",
            "apiKey": "test-key",
            "numFlashcards": 3,
            "gradeLevel": "elementary"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );

    let text = body_text(response).await;
    let deck: FlashcardDeck = serde_json::from_str(&text)?;
    assert_eq!(deck.flashcards, cards());
    assert_eq!(model.calls(), 1);

    let prompt = model.last_prompt().unwrap();
    assert!(prompt.starts_with("Generate 3 clear, concise flashcards about Photosynthesis."));
    assert!(prompt.contains(FlashcardPrompts::grade_instructions(GradeLevel::Elementary)));
    Ok(())
}

#[tokio::test]
async fn test_model_failure_before_stream_is_500() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log_path = dir.path().join("app.log");
    let model = Arc::new(MockModel::new(vec![]).rejecting("API key not valid"));
    let app = router(model, EventLog::new(&log_path));

    let response = app
        .oneshot(generate_request(&json!({"topic": "Volcanoes", "apiKey": "bad"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorResponse = serde_json::from_str(&body_text(response).await)?;
    assert_eq!(error.error, "Failed to generate flashcards");

    // the detail goes to the event log, not to the caller
    let log = std::fs::read_to_string(&log_path)?;
    assert!(log.contains("INFO: API route called: generate-flashcards"));
    assert!(log.contains("ERROR: Error generating flashcards"));
    assert!(log.contains("API key not valid"));
    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_500() -> Result<()> {
    let model = Arc::new(MockModel::new(vec![]));
    let app = router(model.clone(), EventLog::disabled());

    let request = Request::builder()
        .method("POST")
        .uri("/api/generate-flashcards")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("Failed to generate flashcards"));
    assert_eq!(model.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_count_is_clamped_and_coerced() -> Result<()> {
    let cases = [
        (json!(100), 30),
        (json!(0), 1),
        (json!(-4), 1),
        (json!("7"), 7),
        (json!(12.9), 12),
        (json!("many"), 10),
        (Value::Null, 1),
        (json!(""), 1),
    ];

    for (raw, expected) in cases {
        let model = Arc::new(MockModel::with_cards(&cards(), 64));
        let app = router(model.clone(), EventLog::disabled());
        let response = app
            .oneshot(generate_request(&json!({
                "topic": "Tides",
                "apiKey": "k",
                "numFlashcards": raw
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let prompt = model.last_prompt().unwrap();
        assert!(
            prompt.starts_with(&format!("Generate {expected} clear, concise flashcards")),
            "{raw} should become {expected}: {prompt}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_unknown_grade_uses_middle_template() -> Result<()> {
    let mut prompts = Vec::new();
    for grade in [json!("middle"), json!("kindergarten"), Value::Null] {
        let model = Arc::new(MockModel::with_cards(&cards(), 64));
        let app = router(model.clone(), EventLog::disabled());
        app.oneshot(generate_request(&json!({
            "topic": "Tides",
            "apiKey": "k",
            "gradeLevel": grade
        })))
        .await
        .unwrap();
        prompts.push(model.last_prompt().unwrap());
    }

    assert_eq!(prompts[0], prompts[1]);
    assert_eq!(prompts[0], prompts[2]);
    assert!(prompts[0].contains(FlashcardPrompts::grade_instructions(GradeLevel::Middle)));
    Ok(())
}

#[tokio::test]
async fn test_mid_stream_failure_truncates_body() -> Result<()> {
    let model = Arc::new(
        MockModel::new(vec![r#"{"flashcards":[{"word":"Magma","#.to_string()])
            .with_ending(MockEnding::Fail("connection reset".into())),
    );
    let app = router(model, EventLog::disabled());

    let response = app
        .oneshot(generate_request(&json!({"topic": "Volcanoes", "apiKey": "k"})))
        .await
        .unwrap();

    // headers were already sent; the failure shows up in the body
    assert_eq!(response.status(), StatusCode::OK);
    assert!(to_bytes(response.into_body(), usize::MAX).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let app = router(Arc::new(MockModel::new(vec![])), EventLog::disabled());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await)?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["model"], "mock-model");
    Ok(())
}
