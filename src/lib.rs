//! # Pergamino - Certificate Template Engine
//!
//! Pergamino is a Rust library for designing certificate templates and
//! batch-generating filled-in documents. It provides:
//!
//! - **Template model**: positioned text/image blocks with a JSON wire format
//! - **Editor core**: selection, drag, resize, and in-place text editing
//! - **Placeholders**: `{field}` tokens substituted from tabular data
//! - **Export**: one PDF page per data row, rendered headlessly
//!
//! ## Quick Start
//!
//! ```
//! use pergamino::editor::{Editor, HitTarget, Point};
//! use pergamino::template::{Element, TemplateStore};
//!
//! // Build a template and manipulate it through the editor
//! let mut store = TemplateStore::new();
//! store.add_element(Element::text_block("title"))?;
//!
//! let mut editor = Editor::new();
//! editor.pointer_down(&mut store, HitTarget::Element("title".into()), Point::new(0.0, 0.0));
//! editor.pointer_move(&mut store, Point::new(25.0, 10.0));
//! editor.pointer_up(&mut store);
//!
//! let el = store.template().element("title").unwrap();
//! assert_eq!((el.x, el.y), (125.0, 110.0));
//! # Ok::<(), pergamino::error::PergaminoError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`template`] | Element model, wire format, and store |
//! | [`editor`] | Manipulation state machine and viewport |
//! | [`placeholder`] | `{field}` scanning and substitution |
//! | [`render`] | Headless rasterizer and capture surfaces |
//! | [`export`] | Batch pipeline and PDF assembly |
//! | [`resolve`] | Image source fetching and caching |
//! | [`remote`] | Persistence and asset collaborators |
//! | [`server`] | HTTP API for a designer frontend |
//! | [`error`] | Error types |

pub mod editor;
pub mod error;
pub mod export;
pub mod placeholder;
pub mod remote;
pub mod render;
pub mod resolve;
pub mod server;
pub mod template;

// Re-exports for convenience
pub use error::PergaminoError;
pub use export::{export_batch, ExportOptions, ExportOutcome};
pub use template::{Template, TemplateStore};
