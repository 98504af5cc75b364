//! Font metrics and glyph generation for template rendering.
//!
//! Uses the Spleen bitmap font family, scaled nearest-neighbor to the
//! requested font size. Small sizes start from the 6x12 face to keep strokes
//! legible; everything else scales the 12x24 face down or up.

use std::collections::HashMap;

use spleen_font::{PSF2Font, FONT_12X24, FONT_6X12};

/// Cell dimensions for a given font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontMetrics {
    pub char_width: usize,
    pub char_height: usize,
}

impl FontMetrics {
    /// Metrics for a CSS-style font size in pixels.
    ///
    /// The glyph cell height equals the font size; width follows the 1:2
    /// aspect of the Spleen faces.
    pub fn for_size(font_size: f32) -> FontMetrics {
        let char_height = (font_size.round() as usize).max(6);
        FontMetrics {
            char_width: char_height.div_ceil(2),
            char_height,
        }
    }

    pub fn line_height(&self) -> usize {
        // Matches the browser default line-height of ~1.2 for Arial
        self.char_height * 6 / 5
    }
}

/// Generate a glyph bitmap for a character at the given metrics.
/// Each byte in the result is 0 (off) or 1 (on), `char_width * char_height`.
pub fn generate_glyph(metrics: FontMetrics, ch: char) -> Vec<u8> {
    // Small cells scale up from the 6x12 face, larger ones from 12x24
    let (face, src_w, src_h): (&[u8], usize, usize) = if metrics.char_height < 14 {
        (FONT_6X12, 6, 12)
    } else {
        (FONT_12X24, 12, 24)
    };

    let mut glyph = vec![0u8; metrics.char_width * metrics.char_height];
    let mut spleen = match PSF2Font::new(face) {
        Ok(f) => f,
        Err(_) => {
            draw_box(&mut glyph, metrics.char_width, metrics.char_height);
            return glyph;
        }
    };

    let utf8 = ch.to_string();
    if let Some(spleen_glyph) = spleen.glyph_for_utf8(utf8.as_bytes()) {
        let mut src = vec![0u8; src_w * src_h];
        for (row_y, row) in spleen_glyph.enumerate() {
            for (col_x, on) in row.enumerate() {
                if row_y < src_h && col_x < src_w {
                    src[row_y * src_w + col_x] = if on { 1 } else { 0 };
                }
            }
        }
        scale_bitmap(&src, src_w, src_h, &mut glyph, metrics.char_width, metrics.char_height);
    } else {
        // Unknown chars render as a box outline
        draw_box(&mut glyph, metrics.char_width, metrics.char_height);
    }

    glyph
}

/// Nearest-neighbor scale from src dimensions to dst dimensions.
fn scale_bitmap(src: &[u8], src_w: usize, src_h: usize, dst: &mut [u8], dst_w: usize, dst_h: usize) {
    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let sx = dx * src_w / dst_w;
            let sy = dy * src_h / dst_h;
            let src_idx = sy * src_w + sx;
            let dst_idx = dy * dst_w + dx;
            if src_idx < src.len() && dst_idx < dst.len() {
                dst[dst_idx] = src[src_idx];
            }
        }
    }
}

/// Draw a box outline in the glyph buffer.
fn draw_box(glyph: &mut [u8], width: usize, height: usize) {
    if width == 0 || height == 0 {
        return;
    }
    for x in 0..width {
        glyph[x] = 1;
        glyph[(height - 1) * width + x] = 1;
    }
    for y in 0..height {
        glyph[y * width] = 1;
        glyph[y * width + width - 1] = 1;
    }
}

/// Per-render glyph cache, keyed by metrics and character.
#[derive(Default)]
pub struct GlyphCache {
    glyphs: HashMap<(FontMetrics, char), Vec<u8>>,
}

impl GlyphCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn glyph(&mut self, metrics: FontMetrics, ch: char) -> &[u8] {
        self.glyphs
            .entry((metrics, ch))
            .or_insert_with(|| generate_glyph(metrics, ch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_track_font_size() {
        let m = FontMetrics::for_size(16.0);
        assert_eq!(m.char_height, 16);
        assert_eq!(m.char_width, 8);
        assert_eq!(m.line_height(), 19);

        // Tiny sizes are floored to stay legible
        assert_eq!(FontMetrics::for_size(2.0).char_height, 6);
    }

    #[test]
    fn glyph_has_ink() {
        let metrics = FontMetrics::for_size(24.0);
        let glyph = generate_glyph(metrics, 'A');
        assert_eq!(glyph.len(), metrics.char_width * metrics.char_height);
        assert!(glyph.iter().any(|&p| p != 0));
    }

    #[test]
    fn space_is_blank() {
        let metrics = FontMetrics::for_size(16.0);
        let glyph = generate_glyph(metrics, ' ');
        assert!(glyph.iter().all(|&p| p == 0));
    }

    #[test]
    fn cache_returns_identical_bitmaps() {
        let mut cache = GlyphCache::new();
        let metrics = FontMetrics::for_size(16.0);
        let first = cache.glyph(metrics, 'x').to_vec();
        let second = cache.glyph(metrics, 'x').to_vec();
        assert_eq!(first, second);
        assert_eq!(first, generate_glyph(metrics, 'x'));
    }
}
