//! Preview and export API handlers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::editor::Viewport;
use crate::export::{export_batch, ExportOptions};
use crate::placeholder::{DataSet, Mapping};
use crate::render::{encode_png, render_template, RasterSurface};
use crate::resolve::ImageResolver;
use crate::template::{PageLayout, Template, TemplateStore};

use super::super::state::AppState;

/// Request body for the preview endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub template: Template,
    /// Layout keyword ("landscape" / "portrait"); server default when absent.
    #[serde(default)]
    pub layout: Option<String>,
}

/// Request body for the export endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub template: Template,
    #[serde(default)]
    pub dataset: DataSet,
    #[serde(default)]
    pub mapping: Mapping,
    #[serde(default)]
    pub layout: Option<String>,
}

fn resolve_layout(
    named: Option<&str>,
    fallback: PageLayout,
) -> Result<PageLayout, (StatusCode, String)> {
    match named {
        None => Ok(fallback),
        Some(name) => PageLayout::by_name(name)
            .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("Unknown layout: {}", name))),
    }
}

/// POST /api/preview - Render a template to a PNG page image.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PreviewRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let layout = resolve_layout(req.layout.as_deref(), state.config.layout)?;

    // Uploaded assets are cached at upload time; this picks up external URLs
    let resolver = ImageResolver::new(state.images.clone())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    resolver.resolve(&req.template).await;

    let images = state.images.read().await.clone();
    let png_bytes = tokio::task::spawn_blocking(move || {
        let page = render_template(&req.template, &layout, &images);
        encode_png(&page)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Render task error: {}", e)))?
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png_bytes))
}

/// POST /api/export - Run a batch export and return the assembled PDF.
///
/// One page per data row; an empty data set yields one page of the template
/// as sent. Rows whose capture failed are reported in `x-skipped-rows`.
pub async fn export(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExportRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let layout = resolve_layout(req.layout.as_deref(), state.config.layout)?;

    let resolver = ImageResolver::new(state.images.clone())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    resolver.resolve(&req.template).await;

    let mut store = TemplateStore::with_template(req.template);
    let mut surface = RasterSurface::new(layout, state.images.clone());
    let mut viewport = Viewport::new();

    println!(
        "[export] {} row(s), layout {}",
        req.dataset.rows.len(),
        layout.label
    );
    let outcome = export_batch(
        &mut store,
        Some(&mut surface),
        &mut viewport,
        &req.dataset,
        &req.mapping,
        &ExportOptions::default(),
    )
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Export failed: {}", e)))?;

    let skipped = outcome
        .skipped_rows
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::HeaderName::from_static("x-export-pages"),
                outcome.pages.to_string(),
            ),
            (
                header::HeaderName::from_static("x-skipped-rows"),
                skipped,
            ),
        ],
        outcome.pdf,
    ))
}
