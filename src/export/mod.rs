//! # Batch Export Pipeline
//!
//! Drives the per-row substitute → install → capture → append loop and
//! assembles the captures into a single multi-page PDF.
//!
//! ## Contract
//!
//! - The original template is restored on every exit path, success or error.
//! - A missing surface aborts the whole run ([`PergaminoError::NoSurface`]);
//!   a failed capture skips that row and the run continues.
//! - An empty data set still produces one page from the current template.
//! - Captures happen at 1:1 scale via [`Viewport::native_scale`], regardless
//!   of the on-screen zoom at the time of the request.
//!
//! [`RenderSurface::install`] returning is the synchronization point: the
//! surface is up to date when it returns, so no settle delay is needed. The
//! optional [`ExportOptions::settle`] wait exists only for surfaces that
//! cannot give that guarantee.

mod pdf;

pub use pdf::PdfBuilder;

use std::time::Duration;

use crate::editor::Viewport;
use crate::error::PergaminoError;
use crate::placeholder::{render_template_for_row, DataSet, Mapping};
use crate::render::RenderSurface;
use crate::template::TemplateStore;

/// Knobs for one export run.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Extra wait after install, for surfaces whose install return does not
    /// already guarantee the content is presentable.
    pub settle: Option<Duration>,
}

/// The assembled PDF plus per-run accounting.
#[derive(Debug)]
pub struct ExportOutcome {
    pub pdf: Vec<u8>,
    pub pages: usize,
    /// Zero-based indices of rows whose capture failed.
    pub skipped_rows: Vec<usize>,
}

/// Export one PDF page per data row (or one page of the template as-is when
/// the data set is empty).
pub async fn export_batch(
    store: &mut TemplateStore,
    surface: Option<&mut dyn RenderSurface>,
    viewport: &mut Viewport,
    dataset: &DataSet,
    mapping: &Mapping,
    options: &ExportOptions,
) -> Result<ExportOutcome, PergaminoError> {
    let surface = surface.ok_or(PergaminoError::NoSurface)?;

    let original = store.template().clone();
    let result = run_batch(store, surface, viewport, dataset, mapping, options).await;
    // The editing template comes back no matter how the run ended
    store.replace_template(original);
    result
}

async fn run_batch(
    store: &mut TemplateStore,
    surface: &mut dyn RenderSurface,
    viewport: &mut Viewport,
    dataset: &DataSet,
    mapping: &Mapping,
    options: &ExportOptions,
) -> Result<ExportOutcome, PergaminoError> {
    let mut builder = PdfBuilder::new();
    let mut skipped_rows = Vec::new();

    if dataset.rows.is_empty() {
        surface.install(store.template()).await?;
        settle(options).await;
        capture_page(surface, viewport, &mut builder, 0, &mut skipped_rows)?;
    } else {
        let original = store.template().clone();
        for (index, row) in dataset.rows.iter().enumerate() {
            let rendered = render_template_for_row(&original, mapping, row);
            store.replace_template(rendered);
            surface.install(store.template()).await?;
            settle(options).await;
            capture_page(surface, viewport, &mut builder, index, &mut skipped_rows)?;
        }
    }

    let pages = builder.page_count();
    let pdf = builder.finish()?;
    Ok(ExportOutcome {
        pdf,
        pages,
        skipped_rows,
    })
}

fn capture_page(
    surface: &mut dyn RenderSurface,
    viewport: &mut Viewport,
    builder: &mut PdfBuilder,
    index: usize,
    skipped_rows: &mut Vec<usize>,
) -> Result<(), PergaminoError> {
    let _guard = viewport.native_scale();
    match surface.capture() {
        Some(page) => builder.add_page(&page.image)?,
        None => {
            println!("[export] Capture failed for row {}, skipping", index + 1);
            skipped_rows.push(index);
        }
    }
    Ok(())
}

async fn settle(options: &ExportOptions) {
    if let Some(delay) = options.settle {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RasterSurface, RenderSurface};
    use crate::resolve::new_cache;
    use crate::template::{Element, Template, A4_LANDSCAPE};
    use lopdf::Document;
    use serde_json::json;

    fn dataset(rows: Vec<serde_json::Value>) -> DataSet {
        DataSet {
            columns: vec!["Col1".to_string()],
            rows: rows
                .into_iter()
                .map(|v| v.as_object().cloned().unwrap_or_default())
                .collect(),
        }
    }

    fn store_with_text() -> TemplateStore {
        let mut template = Template::untitled();
        template.elements.push(Element::text_block("t"));
        TemplateStore::with_template(template)
    }

    #[tokio::test]
    async fn missing_surface_is_fatal() {
        let mut store = store_with_text();
        let mut viewport = Viewport::new();
        let err = export_batch(
            &mut store,
            None,
            &mut viewport,
            &DataSet::default(),
            &Mapping::new(),
            &ExportOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PergaminoError::NoSurface));
    }

    #[tokio::test]
    async fn empty_dataset_exports_one_page() {
        let mut store = store_with_text();
        let mut surface = RasterSurface::new(A4_LANDSCAPE, new_cache());
        let mut viewport = Viewport::new();

        let outcome = export_batch(
            &mut store,
            Some(&mut surface),
            &mut viewport,
            &DataSet::default(),
            &Mapping::new(),
            &ExportOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.pages, 1);
        assert!(outcome.skipped_rows.is_empty());
        let doc = Document::load_mem(&outcome.pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[tokio::test]
    async fn one_page_per_row_and_template_restored() {
        let mut store = store_with_text();
        let before = store.template().clone();
        let mut surface = RasterSurface::new(A4_LANDSCAPE, new_cache());
        let mut viewport = Viewport::new();
        viewport.rescale(641.5, 1123.0);
        let scale_before = viewport.scale();

        let rows = dataset(vec![
            json!({"Col1": "Ana"}),
            json!({"Col1": "Ben"}),
            json!({"Col1": "Cho"}),
        ]);
        let mapping = Mapping::from([("name".to_string(), "Col1".to_string())]);

        let outcome = export_batch(
            &mut store,
            Some(&mut surface),
            &mut viewport,
            &rows,
            &mapping,
            &ExportOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.pages, 3);
        let doc = Document::load_mem(&outcome.pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 3);

        // The editing template and the viewport scale both came back
        assert_eq!(store.template(), &before);
        assert_eq!(viewport.scale(), scale_before);
    }

    /// Surface double that records installed text and can fail capture.
    struct RecordingSurface {
        installed_texts: Vec<String>,
        fail_captures: bool,
    }

    impl RecordingSurface {
        fn new(fail_captures: bool) -> Self {
            Self {
                installed_texts: Vec::new(),
                fail_captures,
            }
        }
    }

    #[async_trait::async_trait]
    impl RenderSurface for RecordingSurface {
        async fn install(&mut self, template: &Template) -> Result<(), PergaminoError> {
            let text = template
                .elements
                .iter()
                .filter_map(|el| el.text())
                .collect::<Vec<_>>()
                .join("|");
            self.installed_texts.push(text);
            Ok(())
        }

        fn capture(&self) -> Option<crate::render::CapturedPage> {
            if self.fail_captures {
                return None;
            }
            Some(crate::render::CapturedPage {
                image: image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 0, 255])),
            })
        }
    }

    #[tokio::test]
    async fn rows_are_substituted_in_order() {
        let mut template = Template::untitled();
        let mut el = Element::text_block("t");
        if let crate::template::Properties::Text(p) = &mut el.properties {
            p.text = "Hi {name}".into();
        }
        template.elements.push(el);
        let mut store = TemplateStore::with_template(template);

        let mut surface = RecordingSurface::new(false);
        let mut viewport = Viewport::new();
        let rows = dataset(vec![json!({"Col1": "Ana"}), json!({"Col1": "Ben"})]);
        let mapping = Mapping::from([("name".to_string(), "Col1".to_string())]);

        let outcome = export_batch(
            &mut store,
            Some(&mut surface),
            &mut viewport,
            &rows,
            &mapping,
            &ExportOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.pages, 2);
        assert_eq!(surface.installed_texts, vec!["Hi Ana", "Hi Ben"]);
        // Original placeholder text restored after the run
        assert_eq!(store.template().element("t").unwrap().text(), Some("Hi {name}"));
    }

    #[tokio::test]
    async fn failed_captures_skip_rows_but_keep_the_run_alive() {
        let mut store = store_with_text();
        // Every capture fails
        let mut surface = RecordingSurface::new(true);
        let mut viewport = Viewport::new();
        let rows = dataset(vec![json!({"Col1": "Ana"}), json!({"Col1": "Ben"})]);

        let outcome = export_batch(
            &mut store,
            Some(&mut surface),
            &mut viewport,
            &rows,
            &Mapping::new(),
            &ExportOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.pages, 0);
        assert_eq!(outcome.skipped_rows, vec![0, 1]);
        assert_eq!(surface.installed_texts.len(), 2);
    }
}
