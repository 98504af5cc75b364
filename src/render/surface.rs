//! The capture seam between the export pipeline and whatever presents the
//! canvas.
//!
//! A [`RenderSurface`] accepts a template via [`RenderSurface::install`] and
//! hands back pixels via [`RenderSurface::capture`]. `install` returning `Ok`
//! means the surface has fully applied the template; the pipeline treats that
//! return as its synchronization point and captures immediately.

use async_trait::async_trait;
use image::RgbaImage;

use crate::error::PergaminoError;
use crate::render::render_template;
use crate::resolve::ImageCache;
use crate::template::{PageLayout, Template};

/// One page of captured pixels at the layout's native 1:1 resolution.
#[derive(Debug, Clone)]
pub struct CapturedPage {
    pub image: RgbaImage,
}

impl CapturedPage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Something that can present a template and be captured.
///
/// The pipeline only ever holds `&mut dyn RenderSurface`; a headless raster
/// surface and a recording test double both implement this.
#[async_trait]
pub trait RenderSurface: Send {
    /// Present the given template. Returning `Ok` means the surface is fully
    /// up to date and safe to capture.
    async fn install(&mut self, template: &Template) -> Result<(), PergaminoError>;

    /// Capture the currently installed content, or None if the surface has
    /// nothing presentable (e.g. capture backend failure).
    fn capture(&self) -> Option<CapturedPage>;
}

/// Headless surface that rasterizes templates directly.
pub struct RasterSurface {
    layout: PageLayout,
    images: ImageCache,
    current: Option<RgbaImage>,
}

impl RasterSurface {
    pub fn new(layout: PageLayout, images: ImageCache) -> Self {
        Self {
            layout,
            images,
            current: None,
        }
    }
}

#[async_trait]
impl RenderSurface for RasterSurface {
    async fn install(&mut self, template: &Template) -> Result<(), PergaminoError> {
        let images = self.images.read().await.clone();
        self.current = Some(render_template(template, &self.layout, &images));
        Ok(())
    }

    fn capture(&self) -> Option<CapturedPage> {
        self.current.clone().map(|image| CapturedPage { image })
    }
}
