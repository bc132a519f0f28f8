//! Streaming response handling

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use futures::StreamExt;

use crate::errors::Result;

/// Boxed stream of text deltas
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Streaming response from LLM
pub struct StreamingResponse {
    stream: TextStream,
}

impl StreamingResponse {
    pub fn new(stream: TextStream) -> Self {
        Self { stream }
    }

    /// Build a response from fixed chunks
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: Send + 'static,
    {
        Self::new(Box::pin(futures::stream::iter(chunks.into_iter().map(Ok))))
    }

    /// End the stream once `limit` has elapsed, however far it got
    #[must_use]
    pub fn with_deadline(self, limit: Duration) -> Self {
        let deadline = tokio::time::sleep(limit);
        Self::new(Box::pin(self.stream.take_until(deadline)))
    }

    /// Collect all chunks into a single string
    pub async fn collect_all(mut self) -> Result<String> {
        let mut result = String::new();
        while let Some(chunk) = self.stream.next().await {
            result.push_str(&chunk?);
        }
        Ok(result)
    }

    /// Get the underlying stream
    pub fn into_stream(self) -> TextStream {
        self.stream
    }
}
