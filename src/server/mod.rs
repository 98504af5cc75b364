//! # HTTP Server for the Template Designer API
//!
//! Exposes template persistence, image upload, preview rendering, and batch
//! PDF export over HTTP for a designer frontend.
//!
//! ## Usage
//!
//! ```bash
//! pergamino serve --listen 0.0.0.0:8080
//! ```

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::error::PergaminoError;

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use pergamino::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), pergamino::error::PergaminoError> {
/// serve(ServerConfig::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), PergaminoError> {
    let app_state = Arc::new(AppState::new(config.clone()));
    let app = router(app_state);

    println!("Pergamino HTTP server starting...");
    println!("Listening on: {}", config.listen_addr);
    println!("Default layout: {}", config.layout.label);
    println!();

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The API router, separated out so tests can drive it without a socket.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        // Template API
        .route(
            "/api/templates",
            post(handlers::templates::save).get(handlers::templates::list),
        )
        .route("/api/templates/:id", get(handlers::templates::fetch))
        // Asset API (50MB limit for uploads)
        .route(
            "/api/upload",
            post(handlers::upload::upload).layer(DefaultBodyLimit::max(50 * 1024 * 1024)),
        )
        .route("/api/assets/:id", get(handlers::upload::asset))
        // Render API
        .route("/api/preview", post(handlers::render_api::preview))
        .route("/api/export", post(handlers::render_api::export))
        .with_state(app_state)
}
