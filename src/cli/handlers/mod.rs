//! CLI command handlers module
//!
//! One file per command:
//! - serve: API server
//! - generate: stream, render and export flashcards
//! - key: the saved Gemini API key
//! - info: configuration display

pub mod generate;
pub mod info;
pub mod key;
pub mod serve;

// Re-export all public handlers
pub use generate::*;
pub use info::*;
pub use key::*;
pub use serve::*;
