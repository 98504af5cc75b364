//! # Manipulation State Machine
//!
//! Interprets pointer/keyboard gestures into template mutations: select,
//! drag, resize, and in-place text editing. All transitions happen on the
//! single interaction thread; the store is borrowed per event, so the editor
//! never holds the template while the export pipeline owns it.
//!
//! ## Gesture model
//!
//! - **Drag** applies incremental deltas and advances its origin each step,
//!   so repeated rounding never accumulates into drift.
//! - **Resize** computes against a fixed origin snapshot (position + size at
//!   gesture start), so hitting the minimum bounding box repeatedly cannot
//!   drift either.
//! - **Text editing** snapshots the content into a buffer on double-click
//!   and commits it back on blur.
//!
//! Pointer-move/up handling is logically owned by the active gesture: the
//! events are ignored unless a gesture is in progress, and [`Editor::cancel`]
//! (window blur, focus loss) unconditionally releases the gesture — the
//! scoped-acquisition discipline the old callback-attached listeners lacked.

mod viewport;

pub use viewport::{compute_scale, NativeScaleGuard, Point, Viewport, SCALE_MARGIN};

use crate::template::{ElementUpdate, Properties, TemplateStore};

/// What the pointer went down on, as resolved by the presentation layer's
/// hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitTarget {
    /// An element body.
    Element(String),
    /// The resize handle of the currently selected element.
    ResizeHandle(String),
    /// Empty canvas background.
    Background,
}

/// The transient gesture, created on pointer-down or double-click and
/// discarded on pointer-up/blur. Never persisted.
#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    None,
    Drag {
        element: String,
        /// Advances to the current pointer position after every step.
        last: Point,
    },
    Resize {
        element: String,
        /// Fixed snapshot: pointer position and size at gesture start.
        origin: Point,
        origin_width: f64,
        origin_height: f64,
    },
    EditText {
        element: String,
        buffer: String,
    },
}

/// Editor state machine. Owns only transient gesture state; the template and
/// selection live in the [`TemplateStore`] passed to each event method.
#[derive(Debug, Default)]
pub struct Editor {
    gesture: Gesture,
}

impl Default for Gesture {
    fn default() -> Self {
        Gesture::None
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether move/up events are currently being listened for.
    pub fn gesture_active(&self) -> bool {
        matches!(self.gesture, Gesture::Drag { .. } | Gesture::Resize { .. })
    }

    /// Whether a text element is in edit mode.
    pub fn editing_text(&self) -> bool {
        matches!(self.gesture, Gesture::EditText { .. })
    }

    /// The in-progress edit buffer, if editing.
    pub fn edit_buffer(&self) -> Option<&str> {
        match &self.gesture {
            Gesture::EditText { buffer, .. } => Some(buffer),
            _ => None,
        }
    }

    /// Pointer-down at a canvas-logical position on the given hit target.
    pub fn pointer_down(&mut self, store: &mut TemplateStore, target: HitTarget, at: Point) {
        // Entering any gesture implicitly exits another element's active one;
        // a pending text edit commits first.
        self.commit_text_edit(store);

        match target {
            HitTarget::Element(id) => {
                store.select_element(Some(id.clone()));
                self.gesture = Gesture::Drag {
                    element: id,
                    last: at,
                };
            }
            HitTarget::ResizeHandle(id) => {
                // Handles only exist on the selected element
                store.select_element(Some(id.clone()));
                let (width, height) = match store.template().element(&id) {
                    Some(el) => (el.width, el.height),
                    None => return,
                };
                self.gesture = Gesture::Resize {
                    element: id,
                    origin: at,
                    origin_width: width,
                    origin_height: height,
                };
            }
            HitTarget::Background => {
                store.select_element(None);
                self.gesture = Gesture::None;
            }
        }
    }

    /// Pointer moved. Ignored unless a drag or resize is in progress.
    pub fn pointer_move(&mut self, store: &mut TemplateStore, at: Point) {
        match &mut self.gesture {
            Gesture::Drag { element, last } => {
                let dx = at.x - last.x;
                let dy = at.y - last.y;
                let Some(el) = store.template().element(element) else {
                    return;
                };
                let update = ElementUpdate::position(el.x + dx, el.y + dy);
                let id = element.clone();
                // Incremental: the origin advances every step
                *last = at;
                // A concurrently removed element is a silent no-op
                let _ = store.update_element(&id, update);
            }
            Gesture::Resize {
                element,
                origin,
                origin_width,
                origin_height,
            } => {
                let dx = at.x - origin.x;
                let dy = at.y - origin.y;
                let Some(el) = store.template().element(element) else {
                    return;
                };
                let (min_w, min_h) = el.kind().min_size();
                let update = ElementUpdate::size(
                    (*origin_width + dx).max(min_w),
                    (*origin_height + dy).max(min_h),
                );
                let id = element.clone();
                let _ = store.update_element(&id, update);
            }
            Gesture::None | Gesture::EditText { .. } => {}
        }
    }

    /// Pointer released: the gesture state is discarded, selection remains.
    pub fn pointer_up(&mut self, _store: &mut TemplateStore) {
        if self.gesture_active() {
            self.gesture = Gesture::None;
        }
    }

    /// Double-click on a text element starts in-place editing.
    ///
    /// Image elements have no edit mode; the event is ignored for them.
    pub fn double_click(&mut self, store: &mut TemplateStore, id: &str) {
        let Some(element) = store.template().element(id) else {
            return;
        };
        let Some(text) = element.text() else {
            return;
        };
        let buffer = text.to_string();
        store.select_element(Some(id.to_string()));
        self.gesture = Gesture::EditText {
            element: id.to_string(),
            buffer,
        };
    }

    /// Replace the edit buffer content (the edit surface's input events).
    pub fn edit_input(&mut self, text: impl Into<String>) {
        if let Gesture::EditText { buffer, .. } = &mut self.gesture {
            *buffer = text.into();
        }
    }

    /// Blur of the edit surface: commit the buffer back into the element.
    pub fn blur(&mut self, store: &mut TemplateStore) {
        self.commit_text_edit(store);
    }

    /// The window lost focus or the gesture owner went away: release any
    /// gesture unconditionally. A pending text edit still commits.
    pub fn cancel(&mut self, store: &mut TemplateStore) {
        self.commit_text_edit(store);
        self.gesture = Gesture::None;
    }

    fn commit_text_edit(&mut self, store: &mut TemplateStore) {
        if !matches!(self.gesture, Gesture::EditText { .. }) {
            return;
        }
        if let Gesture::EditText { element, buffer } = std::mem::take(&mut self.gesture) {
            let Some(el) = store.template().element(&element) else {
                return;
            };
            if let Properties::Text(props) = &el.properties {
                let mut props = props.clone();
                props.text = buffer;
                let _ = store.update_element(&element, ElementUpdate::properties(Properties::Text(props)));
            }
        }
    }
}
