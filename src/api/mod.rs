//! HTTP API surface.

pub mod routes;

pub use routes::{AppState, chat_routes};
