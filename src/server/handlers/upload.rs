//! Image upload and asset serving handlers.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::remote::AssetStore;

use super::super::state::AppState;

/// Response from the upload endpoint: the locator for an image element's
/// `src` plus the decoded dimensions for the editor's default sizing.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub src: String,
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

/// POST /api/upload - Upload an image file.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    // Extract the image field from multipart
    let mut image_data: Option<Vec<u8>> = None;
    let mut content_type = String::from("application/octet-stream");
    let mut filename = String::from("unknown");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "image" {
            filename = field.file_name().unwrap_or("unknown").to_string();
            if let Some(ct) = field.content_type() {
                content_type = ct.to_string();
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read image: {}", e)))?;
            image_data = Some(bytes.to_vec());
            break;
        }
    }

    let image_bytes =
        image_data.ok_or((StatusCode::BAD_REQUEST, "No image field found".to_string()))?;

    // Decode once to validate and measure
    let decoded = image::load_from_memory(&image_bytes)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to decode image: {}", e)))?;
    let width = decoded.width();
    let height = decoded.height();

    let src = state
        .assets
        .upload(&content_type, image_bytes)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Upload failed: {}", e)))?;

    // Render surfaces read decoded sources from the shared cache
    state.images.write().await.insert(src.clone(), decoded);

    println!("[upload] {} ({}x{}) -> {}", filename, width, height, src);
    Ok(Json(UploadResponse {
        src,
        filename,
        width,
        height,
    }))
}

/// GET /api/assets/:id - Serve an uploaded asset's bytes.
pub async fn asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let asset = state
        .assets
        .get(&id)
        .await
        .map_err(|_| (StatusCode::NOT_FOUND, format!("No asset with id {}", id)))?;
    Ok(([(header::CONTENT_TYPE, asset.content_type)], asset.bytes))
}
