//! # Template Rasterizer
//!
//! Renders a template to an RGBA page image at the layout's logical size,
//! one pixel per canvas unit.
//!
//! ## Architecture
//!
//! ```text
//! Template → render_template → RgbaImage
//!                ↓
//!          Paint in zindex order:
//!          - Text: background fill, greedy wrap, aligned bitmap glyphs
//!          - Image: resolved source resized into the box, opacity blended
//!          - Unresolved image: crossed placeholder box
//! ```
//!
//! Text is drawn with the Spleen bitmap faces (see [`font`]); the
//! `fontFamily` property is carried in the model but all families rasterize
//! with the same face.

mod font;
pub mod surface;

pub use font::{generate_glyph, FontMetrics, GlyphCache};
pub use surface::{CapturedPage, RasterSurface, RenderSurface};

use std::collections::HashMap;

use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::PergaminoError;
use crate::template::{Alignment, PageLayout, Properties, Template, TextProperties};

/// Parse a `#rgb` / `#rrggbb` hex color. `"transparent"` and malformed
/// values return None (nothing is painted). Templates arrive as arbitrary
/// JSON, so slicing must tolerate non-ASCII color strings.
fn parse_color(value: &str) -> Option<Rgba<u8>> {
    let hex = value.strip_prefix('#')?;
    let channel = |i: usize, len: usize| {
        hex.get(i..i + len)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
    };
    let (r, g, b) = match hex.len() {
        3 => (
            channel(0, 1)? * 17,
            channel(1, 1)? * 17,
            channel(2, 1)? * 17,
        ),
        6 => (channel(0, 2)?, channel(2, 2)?, channel(4, 2)?),
        _ => return None,
    };
    Some(Rgba([r, g, b, 255]))
}

/// Render a template to an RGBA page image on a white background.
pub fn render_template(
    template: &Template,
    layout: &PageLayout,
    images: &HashMap<String, DynamicImage>,
) -> RgbaImage {
    let mut page = RgbaImage::from_pixel(layout.width, layout.height, Rgba([255, 255, 255, 255]));
    let mut glyphs = GlyphCache::new();

    for element in template.paint_order() {
        let x = element.x.round() as i64;
        let y = element.y.round() as i64;
        let width = element.width.round().max(1.0) as u32;
        let height = element.height.round().max(1.0) as u32;

        match &element.properties {
            Properties::Text(props) => {
                render_text_block(&mut page, &mut glyphs, props, x, y, width, height);
            }
            Properties::Image(props) => match images.get(&props.src) {
                Some(source) => {
                    let resized = source.resize_exact(width, height, FilterType::Triangle);
                    blend_image(&mut page, &resized.to_rgba8(), x, y, props.opacity);
                }
                None => draw_placeholder(&mut page, x, y, width, height),
            },
        }
    }

    page
}

/// Encode a rendered page as PNG bytes.
pub fn encode_png(page: &RgbaImage) -> Result<Vec<u8>, PergaminoError> {
    use image::ImageEncoder;

    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(
            page.as_raw(),
            page.width(),
            page.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e: image::ImageError| PergaminoError::Image(e.to_string()))?;
    Ok(png_bytes)
}

/// Paint a text element: optional background fill, then wrapped and aligned
/// glyph rows. Bold is simulated by double-striking one pixel to the right.
fn render_text_block(
    page: &mut RgbaImage,
    glyphs: &mut GlyphCache,
    props: &TextProperties,
    x: i64,
    y: i64,
    width: u32,
    height: u32,
) {
    if let Some(bg) = parse_color(&props.background_color) {
        fill_rect(page, x, y, width, height, bg);
    }
    let Some(color) = parse_color(&props.color) else {
        return;
    };

    let metrics = FontMetrics::for_size(props.font_size);
    let bold = props.font_weight == "bold";
    let max_cols = (width as usize / metrics.char_width).max(1);
    let line_height = metrics.line_height() as i64;

    let mut row_y = y;
    for line in wrap_text(&props.text, max_cols) {
        if row_y >= y + height as i64 {
            break;
        }
        let line_px = line.chars().count() * metrics.char_width;
        let row_x = match props.alignment {
            Alignment::Left => x,
            Alignment::Center => x + (width as i64 - line_px as i64) / 2,
            Alignment::Right => x + width as i64 - line_px as i64,
        };
        for (i, ch) in line.chars().enumerate() {
            let glyph = glyphs.glyph(metrics, ch);
            let gx = row_x + (i * metrics.char_width) as i64;
            blit_glyph(page, glyph, metrics, gx, row_y, color);
            if bold {
                blit_glyph(page, glyph, metrics, gx + 1, row_y, color);
            }
        }
        row_y += line_height;
    }
}

/// Greedy word wrap to a column budget. Words longer than the budget are
/// split hard; explicit newlines are honored.
fn wrap_text(text: &str, max_cols: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut cols = 0;
        for word in paragraph.split(' ') {
            let word_len = word.chars().count();
            if cols > 0 && cols + 1 + word_len > max_cols {
                lines.push(std::mem::take(&mut line));
                cols = 0;
            }
            if cols > 0 {
                line.push(' ');
                cols += 1;
            }
            if word_len > max_cols {
                // Hard-split oversized words
                for ch in word.chars() {
                    if cols == max_cols {
                        lines.push(std::mem::take(&mut line));
                        cols = 0;
                    }
                    line.push(ch);
                    cols += 1;
                }
            } else {
                line.push_str(word);
                cols += word_len;
            }
        }
        lines.push(line);
    }
    lines
}

fn blit_glyph(
    page: &mut RgbaImage,
    glyph: &[u8],
    metrics: FontMetrics,
    x: i64,
    y: i64,
    color: Rgba<u8>,
) {
    for gy in 0..metrics.char_height {
        for gx in 0..metrics.char_width {
            if glyph[gy * metrics.char_width + gx] != 0 {
                put_pixel_clipped(page, x + gx as i64, y + gy as i64, color);
            }
        }
    }
}

/// Alpha-blend a resized image element onto the page at the given opacity.
fn blend_image(page: &mut RgbaImage, source: &RgbaImage, x: i64, y: i64, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    for (sx, sy, pixel) in source.enumerate_pixels() {
        let px = x + sx as i64;
        let py = y + sy as i64;
        if px < 0 || py < 0 || px >= page.width() as i64 || py >= page.height() as i64 {
            continue;
        }
        let alpha = (pixel[3] as f32 / 255.0) * opacity;
        if alpha <= 0.0 {
            continue;
        }
        let under = page.get_pixel(px as u32, py as u32);
        let blend = |s: u8, d: u8| (s as f32 * alpha + d as f32 * (1.0 - alpha)).round() as u8;
        page.put_pixel(
            px as u32,
            py as u32,
            Rgba([
                blend(pixel[0], under[0]),
                blend(pixel[1], under[1]),
                blend(pixel[2], under[2]),
                255,
            ]),
        );
    }
}

/// Crossed box marking an unresolved image source.
fn draw_placeholder(page: &mut RgbaImage, x: i64, y: i64, width: u32, height: u32) {
    let gray = Rgba([160, 160, 160, 255]);
    for dx in 0..width as i64 {
        put_pixel_clipped(page, x + dx, y, gray);
        put_pixel_clipped(page, x + dx, y + height as i64 - 1, gray);
    }
    for dy in 0..height as i64 {
        put_pixel_clipped(page, x, y + dy, gray);
        put_pixel_clipped(page, x + width as i64 - 1, y + dy, gray);
    }
    let steps = width.max(height) as i64;
    for i in 0..steps {
        let dx = i * (width as i64 - 1) / steps.max(1);
        let dy = i * (height as i64 - 1) / steps.max(1);
        put_pixel_clipped(page, x + dx, y + dy, gray);
        put_pixel_clipped(page, x + width as i64 - 1 - dx, y + dy, gray);
    }
}

fn fill_rect(page: &mut RgbaImage, x: i64, y: i64, width: u32, height: u32, color: Rgba<u8>) {
    for dy in 0..height as i64 {
        for dx in 0..width as i64 {
            put_pixel_clipped(page, x + dx, y + dy, color);
        }
    }
}

fn put_pixel_clipped(page: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && x < page.width() as i64 && y < page.height() as i64 {
        page.put_pixel(x as u32, y as u32, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Element, ImageProperties, A4_LANDSCAPE};

    fn ink_count(page: &RgbaImage) -> usize {
        page.pixels().filter(|p| p.0 != [255, 255, 255, 255]).count()
    }

    #[test]
    fn parse_color_forms() {
        assert_eq!(parse_color("#000000"), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(parse_color("#ff8000"), Some(Rgba([255, 128, 0, 255])));
        assert_eq!(parse_color("#f00"), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(parse_color("transparent"), None);
        assert_eq!(parse_color("#xyz"), None);
        assert_eq!(parse_color("red"), None);
        // Non-ASCII values whose byte length matches a hex form are
        // malformed, not a panic
        assert_eq!(parse_color("#aé"), None);
        assert_eq!(parse_color("#ааа"), None);
        assert_eq!(parse_color("#é0"), None);
    }

    #[test]
    fn non_ascii_color_renders_nothing() {
        let mut template = Template::untitled();
        let mut el = Element::text_block("t");
        if let Properties::Text(props) = &mut el.properties {
            props.color = "#aé".into();
        }
        template.elements.push(el);
        let page = render_template(&template, &A4_LANDSCAPE, &HashMap::new());
        assert_eq!(ink_count(&page), 0);
    }

    #[test]
    fn empty_template_renders_blank_page() {
        let page = render_template(&Template::untitled(), &A4_LANDSCAPE, &HashMap::new());
        assert_eq!((page.width(), page.height()), (1123, 794));
        assert_eq!(ink_count(&page), 0);
    }

    #[test]
    fn text_element_leaves_ink() {
        let mut template = Template::untitled();
        template.elements.push(Element::text_block("t"));
        let page = render_template(&template, &A4_LANDSCAPE, &HashMap::new());
        assert!(ink_count(&page) > 0);
    }

    #[test]
    fn unresolved_image_renders_placeholder() {
        let mut template = Template::untitled();
        template
            .elements
            .push(Element::image_block("i", "missing.png", (100, 100)));
        let page = render_template(&template, &A4_LANDSCAPE, &HashMap::new());
        assert!(ink_count(&page) > 0);
    }

    #[test]
    fn resolved_image_blits_with_opacity() {
        let mut template = Template::untitled();
        let mut el = Element::image_block("i", "red.png", (10, 10));
        el.x = 0.0;
        el.y = 0.0;
        if let Properties::Image(props) = &mut el.properties {
            props.opacity = 0.5;
        }
        template.elements.push(el);

        let red = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let images = HashMap::from([("red.png".to_string(), DynamicImage::ImageRgba8(red))]);
        let page = render_template(&template, &A4_LANDSCAPE, &images);

        // 50% red over white: halfway between
        let px = page.get_pixel(5, 5);
        assert_eq!(px[0], 255);
        assert!((px[1] as i32 - 128).abs() <= 1, "got {:?}", px);
    }

    #[test]
    fn fully_transparent_image_leaves_page_untouched() {
        let mut template = Template::untitled();
        let mut el = Element::image_block("i", "x.png", (10, 10));
        if let Properties::Image(props) = &mut el.properties {
            *props = ImageProperties {
                src: "x.png".into(),
                opacity: 0.0,
            };
        }
        template.elements.push(el);

        let black = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let images = HashMap::from([("x.png".to_string(), DynamicImage::ImageRgba8(black))]);
        let page = render_template(&template, &A4_LANDSCAPE, &images);
        assert_eq!(ink_count(&page), 0);
    }

    #[test]
    fn wrap_honors_budget_and_newlines() {
        assert_eq!(wrap_text("ab cd ef", 5), vec!["ab cd", "ef"]);
        assert_eq!(wrap_text("one\ntwo", 10), vec!["one", "two"]);
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn encode_png_roundtrips() {
        let page = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        let bytes = encode_png(&page).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0), page.get_pixel(0, 0));
    }
}
