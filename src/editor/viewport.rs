//! Screen ↔ canvas coordinate mapping.
//!
//! The canvas has a fixed logical size; only the presentation scale varies
//! with the viewport. During export capture the scale must be 1:1 so pixels
//! come out at full logical resolution — [`NativeScaleGuard`] resets it and
//! restores the previous value on every exit path, including capture errors.

/// Horizontal padding reserved around the canvas when fitting it to a container.
pub const SCALE_MARGIN: f64 = 80.0;

/// A point in logical canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Fit the canvas to a container: `min(1, (container − margin) / canvas)`,
/// floored at zero for degenerate containers. Never upscales past 1:1.
pub fn compute_scale(container_width: f64, canvas_width: f64) -> f64 {
    ((container_width - SCALE_MARGIN) / canvas_width).clamp(0.0, 1.0)
}

/// Current presentation scale, recomputed on viewport resize.
#[derive(Debug, Clone)]
pub struct Viewport {
    scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Recompute the scale for a new container width.
    pub fn rescale(&mut self, container_width: f64, canvas_width: f64) {
        self.scale = compute_scale(container_width, canvas_width);
    }

    /// Screen pixels → logical canvas units.
    pub fn to_canvas(&self, screen: Point) -> Point {
        Point::new(screen.x / self.scale, screen.y / self.scale)
    }

    /// Logical canvas units → screen pixels.
    pub fn to_screen(&self, canvas: Point) -> Point {
        Point::new(canvas.x * self.scale, canvas.y * self.scale)
    }

    /// Temporarily force 1:1 scale for a capture pass.
    pub fn native_scale(&mut self) -> NativeScaleGuard<'_> {
        let saved = self.scale;
        self.scale = 1.0;
        NativeScaleGuard {
            viewport: self,
            saved,
        }
    }
}

/// Restores the presentation scale when dropped, so capture failures can
/// never leave the viewport stuck at 1:1.
pub struct NativeScaleGuard<'a> {
    viewport: &'a mut Viewport,
    saved: f64,
}

impl Drop for NativeScaleGuard<'_> {
    fn drop(&mut self) {
        self.viewport.scale = self.saved;
    }
}
