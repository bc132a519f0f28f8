//! Generative model access
//!
//! - `prompts`: the flashcard prompt and grade-level instructions
//! - `streaming`: boxed text-delta streams
//! - `gemini`: Google Gemini with search grounding
//! - `mock`: scripted model for tests and offline runs

pub mod gemini;
pub mod mock;
pub mod prompts;
pub mod streaming;

use async_trait::async_trait;

pub use gemini::GeminiClient;
pub use mock::MockModel;
pub use prompts::build_flashcard_prompt;
pub use prompts::FlashcardPrompts;
pub use streaming::StreamingResponse;
pub use streaming::TextStream;

use crate::Result;

/// A model that turns a prompt into streamed text.
///
/// The credential comes with each call because every request carries
/// the caller's own key.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Start a generation. Errors returned here happen before any text
    /// was produced; failures after that surface inside the stream.
    async fn stream_text(&self, api_key: &str, prompt: &str) -> Result<StreamingResponse>;

    /// Model identifier, for logs
    fn model_id(&self) -> &str;
}
