//! BizScope — conversational business-intake engine.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod llm;
pub mod proposal;
pub mod store;
