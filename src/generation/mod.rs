//! Client side of a generation: the form, the streaming client and the
//! state it publishes

pub mod client;
pub mod form;
pub mod state;

use std::fmt;

pub use client::GenerationObserver;
pub use client::NoopObserver;
pub use client::StreamingClient;
pub use form::GenerationForm;
pub use state::GenerationState;

use crate::errors::ValidationError;

/// Message shown when a stream fails
pub const GENERATION_FAILED_NOTICE: &str = "Failed to generate flashcards. Please try again.";

/// Short-lived notification for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn generated(count: usize) -> Self {
        Self::Success(format!("Generated {count} flashcards successfully!"))
    }

    pub fn failed() -> Self {
        Self::Error(GENERATION_FAILED_NOTICE.to_string())
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success(message) | Self::Error(message) => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<ValidationError> for Notice {
    fn from(error: ValidationError) -> Self {
        Self::Error(error.to_string())
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
