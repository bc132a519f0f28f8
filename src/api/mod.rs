//! HTTP API: the streaming flashcard generation endpoint

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use routes::api_routes;
pub use routes::build_router;
pub use server::serve_api;
