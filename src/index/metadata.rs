//! Field-type metadata.
//!
//! A [`Metadata`] map declares which top-level JSON fields of a document
//! are indexed and with what type. Fields absent from the metadata are
//! stored with the document but never indexed. The JSON form mirrors the
//! wire shape used by external collaborators:
//!
//! ```json
//! {"id": {"type": "uint"}, "name": {"type": "string"}}
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Declared type of an indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Uint,
    Int,
    Float,
    Bool,
    Date,
}

impl FieldType {
    /// Name used in error messages and the metadata wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Uint => "uint",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
        }
    }

    /// Suffix of the inverted-index database name for this type.
    ///
    /// Dates are stored as their nanosecond timestamp, hence `int`.
    pub fn index_suffix(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Uint => "uint",
            FieldType::Int | FieldType::Date => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-field metadata entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    #[serde(rename = "type")]
    pub kind: FieldType,
}

/// Mapping from field name to declared type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    fields: HashMap<String, FieldMeta>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field declaration.
    pub fn with_field(mut self, name: impl Into<String>, kind: FieldType) -> Self {
        self.insert(name, kind);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, kind: FieldType) {
        self.fields.insert(name.into(), FieldMeta { kind });
    }

    pub fn get(&self, field: &str) -> Option<FieldType> {
        self.fields.get(field).map(|meta| meta.kind)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Fields in ascending name order; the planner iterates this so its
    /// command output is deterministic.
    pub fn sorted_fields(&self) -> Vec<(&str, FieldType)> {
        let mut fields: Vec<(&str, FieldType)> = self
            .fields
            .iter()
            .map(|(name, meta)| (name.as_str(), meta.kind))
            .collect();
        fields.sort_by_key(|(name, _)| *name);
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_form_roundtrip() {
        let metadata = Metadata::new()
            .with_field("id", FieldType::Uint)
            .with_field("createAt", FieldType::Date);

        let json = serde_json::to_string(&metadata).unwrap();
        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);

        let parsed: Metadata =
            serde_json::from_str(r#"{"id": {"type": "uint"}, "name": {"type": "string"}}"#)
                .unwrap();
        assert_eq!(parsed.get("id"), Some(FieldType::Uint));
        assert_eq!(parsed.get("name"), Some(FieldType::String));
    }

    #[test]
    fn test_sorted_fields() {
        let metadata = Metadata::new()
            .with_field("title", FieldType::String)
            .with_field("description", FieldType::String)
            .with_field("id", FieldType::Uint);

        let names: Vec<&str> = metadata.sorted_fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["description", "id", "title"]);
    }

    #[test]
    fn test_date_indexes_as_int() {
        assert_eq!(FieldType::Date.index_suffix(), "int");
        assert_eq!(FieldType::Date.as_str(), "date");
    }
}
