//! Mock model implementation for testing.
//!
//! Streams a fixed script of text chunks instead of calling a provider,
//! so the server and client can be exercised without network access.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use super::StreamingResponse;
use super::TextModel;
use crate::errors::FlashgenError;
use crate::errors::Result;
use crate::models::Flashcard;

/// How the scripted stream ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEnding {
    /// Stream closes after the last chunk
    Complete,
    /// Stream yields an error after the last chunk
    Fail(String),
    /// Stream stays open forever after the last chunk
    Hang,
}

/// A scripted model
#[derive(Debug)]
pub struct MockModel {
    model_id: String,
    chunks: Vec<String>,
    delay: Duration,
    ending: MockEnding,
    reject: Option<String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockModel {
    /// Stream `chunks` in order
    #[must_use]
    pub fn new(chunks: Vec<String>) -> Self {
        Self {
            model_id: "mock-model".to_string(),
            chunks,
            delay: Duration::ZERO,
            ending: MockEnding::Complete,
            reject: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Stream the JSON document for `cards`, split into pieces of `chunk_len` bytes
    #[must_use]
    pub fn with_cards(cards: &[Flashcard], chunk_len: usize) -> Self {
        let document = serde_json::json!({ "flashcards": cards }).to_string();
        Self::new(split_chunks(&document, chunk_len.max(1)))
    }

    /// Pause before each chunk
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_ending(mut self, ending: MockEnding) -> Self {
        self.ending = ending;
        self
    }

    /// Fail every call before streaming starts
    #[must_use]
    pub fn rejecting(mut self, message: impl Into<String>) -> Self {
        self.reject = Some(message.into());
        self
    }

    /// Number of `stream_text` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompt of the most recent call
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|guard| guard.clone())
    }
}

/// Split on char boundaries into pieces of at most `len` bytes (one char minimum)
fn split_chunks(text: &str, len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if !current.is_empty() && current.len() + ch.len_utf8() > len {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl TextModel for MockModel {
    async fn stream_text(&self, _api_key: &str, prompt: &str) -> Result<StreamingResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }

        if let Some(message) = &self.reject {
            return Err(FlashgenError::LlmError(message.clone()));
        }

        let delay = self.delay;
        let body = futures::stream::iter(self.chunks.clone()).then(move |chunk| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok::<_, FlashgenError>(chunk)
        });

        let stream = match self.ending.clone() {
            MockEnding::Complete => body.boxed(),
            MockEnding::Fail(message) => body
                .chain(futures::stream::once(async move {
                    Err(FlashgenError::Stream(message))
                }))
                .boxed(),
            MockEnding::Hang => body.chain(futures::stream::pending()).boxed(),
        };

        Ok(StreamingResponse::new(stream))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_chunks_respects_char_boundaries() {
        let chunks = split_chunks("aéb", 2);
        assert_eq!(chunks, vec!["a", "é", "b"]);
        assert_eq!(split_chunks("abcd", 3), vec!["abc", "d"]);
    }

    #[tokio::test]
    async fn test_mock_streams_cards() {
        let model = MockModel::with_cards(&[Flashcard::new("Allele", "A gene variant.")], 7);
        let text = model
            .stream_text("key", "prompt")
            .await
            .unwrap()
            .collect_all()
            .await
            .unwrap();

        assert_eq!(
            text,
            r#"{"flashcards":[{"definition":"A gene variant.","word":"Allele"}]}"#
        );
        assert_eq!(model.calls(), 1);
        assert_eq!(model.last_prompt().as_deref(), Some("prompt"));
    }

    #[tokio::test]
    async fn test_mock_rejects() {
        let model = MockModel::new(vec![]).rejecting("quota exceeded");
        assert!(model.stream_text("key", "prompt").await.is_err());
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_fails_mid_stream() {
        let model =
            MockModel::new(vec!["{".to_string()]).with_ending(MockEnding::Fail("reset".into()));
        let result = model.stream_text("key", "p").await.unwrap().collect_all().await;
        assert!(matches!(result, Err(FlashgenError::Stream(_))));
    }
}
