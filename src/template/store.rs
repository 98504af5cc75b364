//! The owned template/selection state container.
//!
//! `TemplateStore` is the single source of truth the editor and the export
//! pipeline both mutate — sequentially, never concurrently. It is passed by
//! `&mut` to whichever subsystem currently owns the interaction, so there is
//! no ambient global state.

use super::{Element, ElementUpdate, Template};
use crate::error::PergaminoError;

/// Template plus selection state, with a narrow mutation API.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    template: Template,
    selected: Option<String>,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateStore {
    /// Start with a fresh untitled template and nothing selected.
    pub fn new() -> Self {
        Self {
            template: Template::untitled(),
            selected: None,
        }
    }

    /// Wrap an existing template (e.g. loaded from the repository).
    pub fn with_template(template: Template) -> Self {
        Self {
            template,
            selected: None,
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn selected_element_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_element(&self) -> Option<&Element> {
        self.selected.as_deref().and_then(|id| self.template.element(id))
    }

    /// Swap in a whole template, keeping selection only if it still resolves.
    ///
    /// Used by the export pipeline to install a substituted clone and to
    /// restore the original afterwards.
    pub fn replace_template(&mut self, template: Template) {
        if let Some(id) = &self.selected
            && template.element(id).is_none()
        {
            self.selected = None;
        }
        self.template = template;
    }

    /// Append an element. Fails if the id is already present.
    pub fn add_element(&mut self, element: Element) -> Result<(), PergaminoError> {
        if self.template.element(&element.id).is_some() {
            return Err(PergaminoError::DuplicateId(element.id));
        }
        self.template.elements.push(element);
        Ok(())
    }

    /// Merge partial changes into the matching element.
    ///
    /// Geometry and zindex merge shallowly; `properties` replaces the whole
    /// payload and must keep the element's variant (the type is immutable).
    /// Gesture-level callers absorb the `NotFound` error as a no-op.
    pub fn update_element(&mut self, id: &str, changes: ElementUpdate) -> Result<(), PergaminoError> {
        let element = self
            .template
            .element_mut(id)
            .ok_or_else(|| PergaminoError::NotFound(id.to_string()))?;

        if let Some(properties) = changes.properties {
            if properties.kind() != element.kind() {
                return Err(PergaminoError::TypeMismatch(id.to_string()));
            }
            element.properties = properties;
        }
        if let Some(x) = changes.x {
            element.x = x;
        }
        if let Some(y) = changes.y {
            element.y = y;
        }
        if let Some(width) = changes.width {
            element.width = width;
        }
        if let Some(height) = changes.height {
            element.height = height;
        }
        if let Some(zindex) = changes.zindex {
            element.zindex = zindex;
        }
        Ok(())
    }

    /// Delete an element, clearing the selection if it referenced it.
    pub fn remove_element(&mut self, id: &str) {
        self.template.elements.retain(|el| el.id != id);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
    }

    /// Set or clear the selection. Always succeeds.
    pub fn select_element(&mut self, id: Option<String>) {
        self.selected = id;
    }
}
