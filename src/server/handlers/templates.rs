//! Template persistence API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::remote::TemplateRepository;
use crate::template::Template;

use super::super::state::AppState;

/// POST /api/templates - Save a template, stamping its timestamps.
///
/// Inserts when the id is new, overwrites otherwise. `createdAt` is set only
/// on the first save; `updatedAt` on every save. Returns the stored template.
pub async fn save(
    State(state): State<Arc<AppState>>,
    Json(mut template): Json<Template>,
) -> Result<Json<Template>, (StatusCode, String)> {
    let first_save = state.repository.fetch(&template.id).await.is_err();
    template.touch_for_save(first_save);

    state
        .repository
        .persist(&template)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Save failed: {}", e)))?;

    println!(
        "[templates] Saved '{}' ({} elements)",
        template.name,
        template.elements.len()
    );
    Ok(Json(template))
}

/// GET /api/templates - List stored templates, newest first.
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Template>>, (StatusCode, String)> {
    let templates = state
        .repository
        .list()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("List failed: {}", e)))?;
    Ok(Json(templates))
}

/// GET /api/templates/:id - Fetch one template.
pub async fn fetch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Template>, (StatusCode, String)> {
    let template = state
        .repository
        .fetch(&id)
        .await
        .map_err(|_| (StatusCode::NOT_FOUND, format!("No template with id {}", id)))?;
    Ok(Json(template))
}
