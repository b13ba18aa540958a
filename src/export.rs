//! Editor export and the persisted-template payload.
//!
//! The visual editor hands back `{ design, html }`. `design` is opaque and
//! only stored; `html` feeds the composer. Saving a template sends
//! `{ name, html, css, objectName }` to the record system; building that
//! payload lives here, the write itself does not.

use serde::{Deserialize, Serialize};

use crate::compose::{compose, ComposedDocument};
use crate::error::TemplateError;
use crate::layout_config::LayoutSettings;
use crate::style::extract_inline_style;

/// What the editor emits on export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorExport {
    #[serde(default)]
    pub design: serde_json::Value,
    pub html: String,
}

impl EditorExport {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            design: serde_json::Value::Null,
            html: html.into(),
        }
    }

    /// Build the payload for saving this export as a named template bound
    /// to `object_name`. The stylesheet is the export's first inline
    /// `<style>` block.
    pub fn to_saved_template(
        &self,
        name: &str,
        object_name: &str,
    ) -> Result<SavedTemplate, TemplateError> {
        let name = name.trim();
        let object_name = object_name.trim();
        if name.is_empty() {
            return Err(TemplateError::MissingName);
        }
        if object_name.is_empty() {
            return Err(TemplateError::MissingObject);
        }

        Ok(SavedTemplate {
            name: name.to_string(),
            html: self.html.clone(),
            css: extract_inline_style(&self.html),
            object_name: object_name.to_string(),
        })
    }

    /// Compose the exported markup for printing.
    pub fn compose(&self, layout: &LayoutSettings) -> ComposedDocument {
        compose(&self.html, layout)
    }
}

/// Body of the persisted-template write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTemplate {
    pub name: String,
    pub html: String,
    pub css: String,
    pub object_name: String,
}
