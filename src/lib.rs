pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod export;
pub mod generation;
pub mod llm;
pub mod logging;
pub mod models;
pub mod partial_json;
pub mod render;
pub mod settings;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod errors_tests;

pub use config::AppConfig;
pub use errors::*;
pub use generation::StreamingClient;
pub use models::Flashcard;
pub use models::GradeLevel;
pub use partial_json::PartialJsonDecoder;
