//! Merge tags – placeholder tokens bound to fields of an external record.
//!
//! Tokens have the fixed form `{{Object.FieldApiName}}`. They travel as
//! ordinary text through composition and rendering; nothing in this crate
//! resolves them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A placeholder for one field of one object type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeTag {
    pub object: String,
    pub field: String,
}

impl MergeTag {
    pub fn new(object: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            field: field.into(),
        }
    }

    /// The literal token, e.g. `{{Account.Name}}`.
    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MergeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{{{}.{}}}}}", self.object, self.field)
    }
}

/// A field as reported by schema introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub label: String,
    pub field_name: String,
}

impl FieldDescriptor {
    pub fn new(label: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            field_name: field_name.into(),
        }
    }
}

/// Object type name → its fields, in introspection order.
pub type TokenVocabulary = BTreeMap<String, Vec<FieldDescriptor>>;

/// One entry of the editor's placeholder picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeTagEntry {
    /// Human label shown in the picker.
    pub name: String,
    /// Token inserted into the template.
    pub value: String,
}

/// Picker entries for one object, preserving field order.
pub fn merge_tags_for(object: &str, fields: &[FieldDescriptor]) -> Vec<MergeTagEntry> {
    fields
        .iter()
        .map(|f| MergeTagEntry {
            name: f.label.clone(),
            value: MergeTag::new(object, &f.field_name).token(),
        })
        .collect()
}

/// Picker entries for every object in the vocabulary.
pub fn editor_merge_tags(vocabulary: &TokenVocabulary) -> BTreeMap<String, Vec<MergeTagEntry>> {
    vocabulary
        .iter()
        .map(|(object, fields)| (object.clone(), merge_tags_for(object, fields)))
        .collect()
}
