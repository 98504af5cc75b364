//! HTTP API handlers.

pub mod render_api;
pub mod templates;
pub mod upload;
