//! # Template Model
//!
//! A single type hierarchy that is both the Rust API and the JSON wire
//! format. `Template` is constructible in Rust and deserializable from the
//! JSON the designer frontend and storage backend exchange.
//!
//! ```
//! use pergamino::template::*;
//!
//! // Rust construction
//! let mut template = Template::untitled();
//! template.elements.push(Element::text_block("t1"));
//!
//! // JSON deserialization (camelCase, element-level "type" tag)
//! let json = r##"{"id":"a","name":"n","createdAt":"2024-01-01T00:00:00Z",
//!   "updatedAt":"2024-01-01T00:00:00Z","description":"","elements":[
//!   {"id":"e1","type":"text","x":0,"y":0,"width":200,"height":100,"zindex":1,
//!    "properties":{"text":"Hi","fontSize":16,"fontFamily":"Arial",
//!     "fontWeight":"normal","color":"#000000","backgroundColor":"transparent",
//!     "alignment":"left"}}]}"##;
//! let parsed: Template = serde_json::from_str(json).unwrap();
//! assert_eq!(parsed.elements.len(), 1);
//! ```

mod store;

pub use store::TemplateStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed logical canvas size for a page layout.
///
/// The logical size never changes during manipulation; only the on-screen
/// scale factor varies with the viewport (see [`crate::editor::Viewport`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub width: u32,
    pub height: u32,
    pub label: &'static str,
}

impl PageLayout {
    /// Look up a layout by label keyword ("landscape" / "portrait").
    pub fn by_name(name: &str) -> Option<PageLayout> {
        match name {
            "a4-landscape" | "landscape" => Some(A4_LANDSCAPE),
            "a4-portrait" | "portrait" => Some(A4_PORTRAIT),
            _ => None,
        }
    }
}

/// A4 landscape at 96 dpi, the designer default.
pub const A4_LANDSCAPE: PageLayout = PageLayout {
    width: 1123,
    height: 794,
    label: "A4 landscape",
};

/// A4 portrait at 96 dpi.
pub const A4_PORTRAIT: PageLayout = PageLayout {
    width: 794,
    height: 1123,
    label: "A4 portrait",
};

/// Text alignment within an element box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Styling for a text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProperties {
    pub text: String,
    pub font_size: f32,
    pub font_family: String,
    /// "normal" or "bold".
    pub font_weight: String,
    /// Hex color, e.g. "#000000".
    pub color: String,
    /// Hex color or "transparent".
    pub background_color: String,
    pub alignment: Alignment,
}

impl Default for TextProperties {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 16.0,
            font_family: "Arial".into(),
            font_weight: "normal".into(),
            color: "#000000".into(),
            background_color: "transparent".into(),
            alignment: Alignment::Left,
        }
    }
}

/// Styling for an image block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageProperties {
    /// Locator returned by the asset store (URL or local path).
    pub src: String,
    /// 0.0 = transparent, 1.0 = fully opaque.
    pub opacity: f32,
}

impl Default for ImageProperties {
    fn default() -> Self {
        Self {
            src: String::new(),
            opacity: 1.0,
        }
    }
}

/// Type-specific element payload.
///
/// Adjacently tagged and flattened into [`Element`], so the wire format is
/// `{"type": "text", …, "properties": {…}}`. Because the tag and payload are
/// one sum type, a text element can never carry image properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "properties", rename_all = "lowercase")]
pub enum Properties {
    Text(TextProperties),
    Image(ImageProperties),
}

impl Properties {
    pub fn kind(&self) -> ElementKind {
        match self {
            Properties::Text(_) => ElementKind::Text,
            Properties::Image(_) => ElementKind::Image,
        }
    }
}

/// Element type, derived from the properties variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Text,
    Image,
}

impl ElementKind {
    /// Minimum bounding box, enforced unconditionally during resize.
    pub fn min_size(self) -> (f64, f64) {
        match self {
            ElementKind::Text => (50.0, 30.0),
            ElementKind::Image => (30.0, 30.0),
        }
    }
}

/// A positioned text or image block.
///
/// Geometry is in logical canvas units. Paint order is governed by `zindex`,
/// not sequence position in [`Template::elements`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique within the template, generated once at creation.
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub zindex: i32,
    #[serde(flatten)]
    pub properties: Properties,
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        self.properties.kind()
    }

    /// New text block with the designer defaults.
    pub fn text_block(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: 100.0,
            y: 100.0,
            width: 200.0,
            height: 100.0,
            zindex: 1,
            properties: Properties::Text(TextProperties {
                text: "Edit this text".into(),
                ..Default::default()
            }),
        }
    }

    /// New image block for an uploaded asset, fitted within 400x400
    /// preserving the source aspect ratio.
    pub fn image_block(id: impl Into<String>, src: impl Into<String>, source_size: (u32, u32)) -> Self {
        let (mut width, mut height) = (source_size.0 as f64, source_size.1 as f64);
        const MAX_EDGE: f64 = 400.0;
        if width > MAX_EDGE || height > MAX_EDGE {
            let ratio = (MAX_EDGE / width).min(MAX_EDGE / height);
            width *= ratio;
            height *= ratio;
        }
        Self {
            id: id.into(),
            x: 100.0,
            y: 100.0,
            width,
            height,
            zindex: 0,
            properties: Properties::Image(ImageProperties {
                src: src.into(),
                opacity: 1.0,
            }),
        }
    }

    /// The text content, if this is a text element.
    pub fn text(&self) -> Option<&str> {
        match &self.properties {
            Properties::Text(t) => Some(&t.text),
            Properties::Image(_) => None,
        }
    }
}

/// Partial element changes for [`TemplateStore::update_element`].
///
/// Top-level fields merge shallowly; `properties` replaces the whole payload
/// (and must keep the element's variant).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub zindex: Option<i32>,
    pub properties: Option<Properties>,
}

impl ElementUpdate {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn properties(properties: Properties) -> Self {
        Self {
            properties: Some(properties),
            ..Default::default()
        }
    }
}

/// The designed document: metadata plus an ordered set of positioned elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Template {
    /// Fresh empty template with a generated id.
    pub fn untitled() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Untitled Template".into(),
            created_at: now,
            updated_at: now,
            description: "Untitled".into(),
            elements: Vec::new(),
        }
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|el| el.id == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|el| el.id == id)
    }

    /// Elements in paint order: ascending `zindex`, insertion order for ties.
    pub fn paint_order(&self) -> Vec<&Element> {
        let mut ordered: Vec<&Element> = self.elements.iter().collect();
        ordered.sort_by_key(|el| el.zindex);
        ordered
    }

    /// Stamp `updated_at` (and `created_at` on first save) before persisting.
    pub fn touch_for_save(&mut self, first_save: bool) {
        let now = Utc::now();
        if first_save {
            self.created_at = now;
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn element_wire_format_roundtrip() {
        let el = Element::text_block("e1");
        let json = serde_json::to_value(&el).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["properties"]["fontSize"], 16.0);
        assert_eq!(json["properties"]["backgroundColor"], "transparent");

        let back: Element = serde_json::from_value(json).unwrap();
        assert_eq!(back, el);
    }

    #[test]
    fn image_element_wire_format() {
        let el = Element::image_block("img", "/api/assets/abc", (200, 100));
        let json = serde_json::to_value(&el).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["properties"]["src"], "/api/assets/abc");
        assert_eq!(json["properties"]["opacity"], 1.0);
    }

    #[test]
    fn image_block_fits_within_max_edge() {
        let el = Element::image_block("img", "x", (800, 400));
        assert_eq!(el.width, 400.0);
        assert_eq!(el.height, 200.0);

        // Small images keep their native size
        let small = Element::image_block("img2", "x", (120, 80));
        assert_eq!(small.width, 120.0);
        assert_eq!(small.height, 80.0);
    }

    #[test]
    fn mismatched_properties_fail_to_deserialize() {
        // "type": "image" with text properties has no "src" field
        let json = r##"{"id":"e","type":"image","x":0,"y":0,"width":50,"height":50,
            "zindex":0,"properties":{"text":"hi","fontSize":16,"fontFamily":"A",
            "fontWeight":"normal","color":"#000","backgroundColor":"transparent",
            "alignment":"left"}}"##;
        assert!(serde_json::from_str::<Element>(json).is_err());
    }

    #[test]
    fn paint_order_uses_zindex_not_sequence() {
        let mut template = Template::untitled();
        let mut top = Element::text_block("top");
        top.zindex = 5;
        let mut bottom = Element::text_block("bottom");
        bottom.zindex = 1;
        template.elements.push(top);
        template.elements.push(bottom);

        let order: Vec<&str> = template.paint_order().iter().map(|el| el.id.as_str()).collect();
        assert_eq!(order, vec!["bottom", "top"]);
    }

    #[test]
    fn min_sizes_per_kind() {
        assert_eq!(ElementKind::Text.min_size(), (50.0, 30.0));
        assert_eq!(ElementKind::Image.min_size(), (30.0, 30.0));
    }
}
