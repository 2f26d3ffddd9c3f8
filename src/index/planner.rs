//! Indexing planner.
//!
//! [`build_add`] decomposes one document into the ordered command
//! sequence that persists it: first the `set` storing the raw JSON in
//! `document.db`, then one `mergeset` per (field, term) pair against the
//! field's inverted-index database.
//!
//! Output is deterministic: indexed fields are processed in ascending
//! name order; string terms keep first-occurrence order with the full
//! phrase last; duplicate (field, term) pairs collapse to the first
//! occurrence. Uniqueness per (document, field, term) is what keeps
//! merge-sets exact inside a batch, where reads see pre-batch state.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::analysis;
use crate::command::{Command, Operand};
use crate::error::{MyricaError, Result};
use crate::index::metadata::{FieldType, Metadata};
use crate::store::DOCUMENT_DB;

/// ANSI-C date layout (`Mon Jan _2 15:04:05 2006`) as a chrono format.
pub const ANSIC_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Plan the command sequence for adding one document.
///
/// With `None` metadata, field types are inferred from the JSON value
/// shapes (see [`infer_metadata`]). Metadata fields missing from the
/// document are skipped; document fields missing from the metadata are
/// stored but not indexed. A field whose JSON shape does not match its
/// declared type aborts the whole document with
/// [`MyricaError::SchemaMismatch`].
pub fn build_add(
    index: &str,
    id: u64,
    document: &[u8],
    metadata: Option<&Metadata>,
    batch: bool,
) -> Result<Vec<Command>> {
    let parsed: Value = serde_json::from_slice(document)
        .map_err(|e| MyricaError::parse(format!("invalid JSON document: {e}")))?;
    let Value::Object(fields) = &parsed else {
        return Err(MyricaError::parse("document root must be a JSON object"));
    };

    let inferred;
    let metadata = match metadata {
        Some(metadata) => metadata,
        None => {
            inferred = infer_metadata(fields);
            &inferred
        }
    };

    let mut commands = vec![Command::set(
        index,
        DOCUMENT_DB,
        Operand::Uint(id),
        Operand::Str(document.to_vec()),
    )
    .batched(batch)];

    for (field, kind) in metadata.sorted_fields() {
        let Some(value) = fields.get(field) else {
            continue;
        };

        let database = format!("{}_{}.idx", field.to_lowercase(), kind.index_suffix());

        match kind {
            FieldType::Uint => {
                let v = value
                    .as_u64()
                    .ok_or_else(|| MyricaError::schema_mismatch(field, "uint"))?;
                commands.push(
                    Command::merge_set(index, &database, Operand::Uint(v), Operand::Uint(id))
                        .batched(batch),
                );
            }
            FieldType::Int => {
                let v = value
                    .as_i64()
                    .ok_or_else(|| MyricaError::schema_mismatch(field, "int"))?;
                commands.push(
                    Command::merge_set(index, &database, Operand::Int(v), Operand::Uint(id))
                        .batched(batch),
                );
            }
            FieldType::Float => {
                let v = value
                    .as_f64()
                    .ok_or_else(|| MyricaError::schema_mismatch(field, "float"))?;
                commands.push(
                    Command::merge_set(index, &database, Operand::Float(v), Operand::Uint(id))
                        .batched(batch),
                );
            }
            FieldType::Bool => {
                let v = value
                    .as_bool()
                    .ok_or_else(|| MyricaError::schema_mismatch(field, "bool"))?;
                commands.push(
                    Command::merge_set(index, &database, Operand::Bool(v), Operand::Uint(id))
                        .batched(batch),
                );
            }
            FieldType::Date => {
                let text = value
                    .as_str()
                    .ok_or_else(|| MyricaError::schema_mismatch(field, "date"))?;
                let nanos = parse_ansic_nanos(field, text)?;
                commands.push(
                    Command::merge_set(index, &database, Operand::Int(nanos), Operand::Uint(id))
                        .batched(batch),
                );
            }
            FieldType::String => {
                let text = value
                    .as_str()
                    .ok_or_else(|| MyricaError::schema_mismatch(field, "string"))?;

                let mut seen = HashSet::new();
                for term in analysis::tokenize(text) {
                    if !seen.insert(term.clone()) {
                        continue;
                    }
                    commands.push(
                        Command::merge_set(
                            index,
                            &database,
                            Operand::Str(term.into_bytes()),
                            Operand::Uint(id),
                        )
                        .batched(batch),
                    );
                }
            }
        }
    }

    Ok(commands)
}

/// Infer a metadata schema from JSON value shapes: strings as `string`,
/// booleans as `bool`, numbers as `uint`, `int` or `float` by
/// representability. Dates cannot be told apart from strings and nested
/// values are not indexable, so neither is inferred.
pub fn infer_metadata(fields: &serde_json::Map<String, Value>) -> Metadata {
    let mut metadata = Metadata::new();
    for (name, value) in fields {
        let kind = match value {
            Value::String(_) => FieldType::String,
            Value::Bool(_) => FieldType::Bool,
            Value::Number(n) => {
                if n.as_u64().is_some() {
                    FieldType::Uint
                } else if n.as_i64().is_some() {
                    FieldType::Int
                } else {
                    FieldType::Float
                }
            }
            _ => continue,
        };
        metadata.insert(name, kind);
    }
    metadata
}

/// Parse an ANSI-C formatted date into its nanosecond Unix timestamp.
fn parse_ansic_nanos(field: &str, text: &str) -> Result<i64> {
    let parsed = NaiveDateTime::parse_from_str(text, ANSIC_FORMAT).map_err(|e| {
        MyricaError::parse(format!(
            "field '{field}': cannot parse '{text}' as an ANSI-C date: {e}"
        ))
    })?;
    parsed
        .and_utc()
        .timestamp_nanos_opt()
        .ok_or_else(|| MyricaError::parse(format!("field '{field}': date out of timestamp range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_uint_document_plan() {
        let doc = br#"{"id": 1}"#;
        let metadata = Metadata::new().with_field("id", FieldType::Uint);

        let commands = build_add("document-sample", 1, doc, Some(&metadata), false).unwrap();

        let expected = vec![
            Command::set(
                "document-sample",
                "document.db",
                Operand::Uint(1),
                Operand::Str(doc.to_vec()),
            ),
            Command::merge_set(
                "document-sample",
                "id_uint.idx",
                Operand::Uint(1),
                Operand::Uint(1),
            ),
        ];
        assert_eq!(commands, expected);
    }

    #[test]
    fn test_string_fields_plan() {
        let doc = br#"{
            "title": "NeoSearch - Reverse Index",
            "description": "Neoway Full Text Search"
        }"#;
        let metadata = Metadata::new()
            .with_field("title", FieldType::String)
            .with_field("description", FieldType::String);

        let commands = build_add("document-sample", 2, doc, Some(&metadata), false).unwrap();

        let term = |db: &str, term: &str| {
            Command::merge_set(
                "document-sample",
                db,
                Operand::Str(term.as_bytes().to_vec()),
                Operand::Uint(2),
            )
        };
        let expected = vec![
            Command::set(
                "document-sample",
                "document.db",
                Operand::Uint(2),
                Operand::Str(doc.to_vec()),
            ),
            term("description_string.idx", "neoway"),
            term("description_string.idx", "full"),
            term("description_string.idx", "text"),
            term("description_string.idx", "search"),
            term("description_string.idx", "neoway full text search"),
            term("title_string.idx", "neosearch"),
            term("title_string.idx", "-"),
            term("title_string.idx", "reverse"),
            term("title_string.idx", "index"),
            term("title_string.idx", "neosearch - reverse index"),
        ];
        assert_eq!(commands, expected);
    }

    #[test]
    fn test_date_document_plan() {
        let now_str = Utc::now().format(ANSIC_FORMAT).to_string();
        let expected_nanos = NaiveDateTime::parse_from_str(&now_str, ANSIC_FORMAT)
            .unwrap()
            .and_utc()
            .timestamp_nanos_opt()
            .unwrap();

        let doc = format!(r#"{{"id": 1, "createAt": "{now_str}"}}"#);
        let metadata = Metadata::new()
            .with_field("id", FieldType::Uint)
            .with_field("createAt", FieldType::Date);

        let commands =
            build_add("document-sample-date", 1, doc.as_bytes(), Some(&metadata), false).unwrap();

        let expected = vec![
            Command::set(
                "document-sample-date",
                "document.db",
                Operand::Uint(1),
                Operand::Str(doc.as_bytes().to_vec()),
            ),
            Command::merge_set(
                "document-sample-date",
                "createat_int.idx",
                Operand::Int(expected_nanos),
                Operand::Uint(1),
            ),
            Command::merge_set(
                "document-sample-date",
                "id_uint.idx",
                Operand::Uint(1),
                Operand::Uint(1),
            ),
        ];
        assert_eq!(commands, expected);
    }

    #[test]
    fn test_duplicate_terms_collapse() {
        let doc = br#"{"name": "go go"}"#;
        let metadata = Metadata::new().with_field("name", FieldType::String);

        let commands = build_add("sample", 1, doc, Some(&metadata), false).unwrap();

        // "go" once, then the phrase.
        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands[1].key,
            Some(Operand::Str(b"go".to_vec()))
        );
        assert_eq!(
            commands[2].key,
            Some(Operand::Str(b"go go".to_vec()))
        );
    }

    #[test]
    fn test_unindexed_and_missing_fields() {
        let doc = br#"{"id": 1, "extra": "not indexed"}"#;
        let metadata = Metadata::new()
            .with_field("id", FieldType::Uint)
            .with_field("missing", FieldType::String);

        let commands = build_add("sample", 1, doc, Some(&metadata), false).unwrap();

        // Document set + id only; "extra" has no metadata, "missing" has no value.
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1].database, "id_uint.idx");
    }

    #[test]
    fn test_schema_mismatch_aborts_document() {
        let doc = br#"{"id": "not a number"}"#;
        let metadata = Metadata::new().with_field("id", FieldType::Uint);

        assert!(matches!(
            build_add("sample", 1, doc, Some(&metadata), false),
            Err(MyricaError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_bad_date_is_a_parse_error() {
        let doc = br#"{"createAt": "2015-01-01T00:00:00Z"}"#;
        let metadata = Metadata::new().with_field("createAt", FieldType::Date);

        assert!(matches!(
            build_add("sample", 1, doc, Some(&metadata), false),
            Err(MyricaError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_json_is_a_parse_error() {
        let metadata = Metadata::new();
        assert!(matches!(
            build_add("sample", 1, b"{not json", Some(&metadata), false),
            Err(MyricaError::Parse(_))
        ));
        assert!(matches!(
            build_add("sample", 1, b"[1, 2]", Some(&metadata), false),
            Err(MyricaError::Parse(_))
        ));
    }

    #[test]
    fn test_inferred_metadata_plan() {
        let doc = br#"{"id": 1, "name": "Neoway Teste", "active": true, "score": -2.5, "tags": ["a"]}"#;

        let commands = build_add("sample", 4, doc, None, false).unwrap();

        let databases: Vec<&str> = commands.iter().map(|cmd| cmd.database.as_str()).collect();
        assert_eq!(
            databases,
            vec![
                "document.db",
                "active_bool.idx",
                "id_uint.idx",
                "name_string.idx",
                "name_string.idx",
                "name_string.idx",
                "score_float.idx",
            ]
        );
        assert_eq!(commands[3].key, Some(Operand::Str(b"neoway".to_vec())));
        assert_eq!(commands[5].key, Some(Operand::Str(b"neoway teste".to_vec())));
    }

    #[test]
    fn test_batch_flag_propagates_to_commands() {
        let doc = br#"{"id": 1}"#;
        let metadata = Metadata::new().with_field("id", FieldType::Uint);

        let commands = build_add("sample", 1, doc, Some(&metadata), true).unwrap();
        assert!(commands.iter().all(|cmd| cmd.batch));
    }
}
